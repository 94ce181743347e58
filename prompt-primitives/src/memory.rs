//! Read-only state access for rendering, backed by an in-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{PrimitiveError, Result};

/// Scope applied to keys that do not name one (`input` means `temp.input`).
pub const DEFAULT_SCOPE: &str = "temp";

/// Read-only view over conversation state.
///
/// Rendering never writes through this trait.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Looks up a value by `scope.name` key.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Returns true when the key holds a value.
    async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}

/// In-process state store keyed by `scope.name`.
#[derive(Debug, Default)]
pub struct StateMemory {
    values: RwLock<HashMap<String, Value>>,
}

impl StateMemory {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::InvalidMemoryKey`] when the key is empty or has
    /// an empty scope or name.
    pub async fn set(&self, key: &str, value: Value) -> Result<()> {
        let key = normalise_key(key)?;
        self.values.write().await.insert(key, value);
        Ok(())
    }

    /// Removes a value, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::InvalidMemoryKey`] for malformed keys.
    pub async fn delete(&self, key: &str) -> Result<Option<Value>> {
        let key = normalise_key(key)?;
        Ok(self.values.write().await.remove(&key))
    }

    /// Number of stored values.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Returns true when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl Memory for StateMemory {
    async fn get(&self, key: &str) -> Option<Value> {
        let key = normalise_key(key).ok()?;
        self.values.read().await.get(&key).cloned()
    }
}

fn normalise_key(key: &str) -> Result<String> {
    let key = key.trim();
    let invalid = |reason: &str| PrimitiveError::InvalidMemoryKey {
        key: key.to_owned(),
        reason: reason.to_owned(),
    };

    if key.is_empty() {
        return Err(invalid("key cannot be empty"));
    }

    match key.split_once('.') {
        None => Ok(format!("{DEFAULT_SCOPE}.{key}")),
        Some((scope, name)) if scope.is_empty() || name.is_empty() => {
            Err(invalid("scope and name must both be non-empty"))
        }
        Some(_) => Ok(key.to_owned()),
    }
}
