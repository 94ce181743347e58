//! Per-turn conversational context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConversationId;

/// Conversational context for the turn being rendered.
///
/// Sections treat this as opaque: it is threaded through every render call so
/// template resolvers and custom sections can inspect the incoming activity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activity_text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

impl TurnContext {
    /// Creates a context for the supplied conversation.
    #[must_use]
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            activity_text: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the text of the incoming activity.
    #[must_use]
    pub fn with_activity_text(mut self, text: impl Into<String>) -> Self {
        self.activity_text = Some(text.into());
        self
    }

    /// Attaches an arbitrary metadata value.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Returns the incoming activity text, if any.
    #[must_use]
    pub fn activity_text(&self) -> Option<&str> {
        self.activity_text.as_deref()
    }

    /// Returns a metadata value by key.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}
