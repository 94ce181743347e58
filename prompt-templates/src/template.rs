//! `{{variable}}` substitution against memory and static defaults.

use std::collections::HashMap;

use async_trait::async_trait;
use prompt_primitives::{Memory, TurnContext};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::resolver::TemplateResolver;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while resolving a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A required variable had no value in memory or defaults.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// The template could not be resolved.
    #[error("template could not be resolved: {reason}")]
    Unresolvable {
        /// Reason for the failure.
        reason: String,
    },
}

impl TemplateError {
    /// Convenience constructor for resolution failures.
    #[must_use]
    pub fn unresolvable(reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            reason: reason.into(),
        }
    }
}

/// Resolves `{{name}}` references.
///
/// A reference is looked up in memory first (`{{$conversation.topic}}` and
/// `{{conversation.topic}}` are equivalent; unscoped names fall into the
/// `temp` scope), then in the resolver's defaults. Unknown references render
/// empty unless the variable is declared required or the resolver is strict.
///
/// # Examples
///
/// ```
/// use prompt_templates::VariableResolver;
///
/// let resolver = VariableResolver::builder()
///     .with_default("persona", "a helpful assistant")
///     .with_required_variable("input")
///     .build();
/// assert!(resolver.is_required("input"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct VariableResolver {
    defaults: HashMap<String, String>,
    required: Vec<String>,
    strict: bool,
}

impl VariableResolver {
    /// Creates a lenient resolver without defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder for configuring resolvers.
    #[must_use]
    pub fn builder() -> VariableResolverBuilder {
        VariableResolverBuilder::default()
    }

    /// Returns true when the variable must resolve to a value.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.strict || self.required.iter().any(|required| required == name)
    }

    /// Returns the default value for a variable.
    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    async fn lookup(&self, name: &str, memory: &dyn Memory) -> TemplateResult<String> {
        if let Some(value) = memory.get(name).await {
            return Ok(value_to_text(value));
        }

        if let Some(value) = self.defaults.get(name) {
            return Ok(value.clone());
        }

        if self.is_required(name) {
            return Err(TemplateError::MissingVariable {
                name: name.to_owned(),
            });
        }

        trace!(variable = name, "optional variable resolved empty");
        Ok(String::new())
    }
}

#[async_trait]
impl TemplateResolver for VariableResolver {
    async fn resolve(
        &self,
        template: &str,
        _context: &TurnContext,
        memory: &dyn Memory,
    ) -> TemplateResult<String> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(TemplateError::unresolvable(format!(
                    "unclosed variable reference at byte {}",
                    template.len() - rest.len() + start
                )));
            };

            let name = after[..end].trim();
            let name = name.strip_prefix('$').unwrap_or(name);
            if name.is_empty() {
                return Err(TemplateError::unresolvable("empty variable reference"));
            }

            output.push_str(&self.lookup(name, memory).await?);
            rest = &after[end + 2..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

/// Builder for [`VariableResolver`].
#[derive(Debug, Default)]
pub struct VariableResolverBuilder {
    defaults: HashMap<String, String>,
    required: Vec<String>,
    strict: bool,
}

impl VariableResolverBuilder {
    /// Sets a default value used when memory has none.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Declares a variable that must resolve to a value.
    #[must_use]
    pub fn with_required_variable(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Makes every variable required.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builds the resolver.
    #[must_use]
    pub fn build(self) -> VariableResolver {
        VariableResolver {
            defaults: self.defaults,
            required: self.required,
            strict: self.strict,
        }
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_primitives::StateMemory;
    use serde_json::json;

    async fn resolve(resolver: &VariableResolver, memory: &StateMemory, template: &str) -> TemplateResult<String> {
        resolver
            .resolve(template, &TurnContext::default(), memory)
            .await
    }

    #[tokio::test]
    async fn memory_values_win_over_defaults() {
        let memory = StateMemory::new();
        memory.set("name", json!("Alice")).await.unwrap();
        let resolver = VariableResolver::builder()
            .with_default("name", "World")
            .with_default("greeting", "Hello")
            .build();

        let rendered = resolve(&resolver, &memory, "{{greeting}} {{ $name }}!").await.unwrap();
        assert_eq!(rendered, "Hello Alice!");
    }

    #[tokio::test]
    async fn scoped_lookups_and_non_string_values() {
        let memory = StateMemory::new();
        memory.set("conversation.turns", json!(3)).await.unwrap();
        let resolver = VariableResolver::new();

        let rendered = resolve(&resolver, &memory, "turns={{conversation.turns}}").await.unwrap();
        assert_eq!(rendered, "turns=3");
    }

    #[tokio::test]
    async fn missing_optional_variables_render_empty() {
        let resolver = VariableResolver::new();
        let rendered = resolve(&resolver, &StateMemory::new(), "[{{absent}}]").await.unwrap();
        assert_eq!(rendered, "[]");
    }

    #[tokio::test]
    async fn required_variables_error_when_missing() {
        let resolver = VariableResolver::builder()
            .with_required_variable("input")
            .build();

        let err = resolve(&resolver, &StateMemory::new(), "Q: {{input}}")
            .await
            .expect_err("should error");
        assert!(matches!(err, TemplateError::MissingVariable { ref name } if name == "input"));
    }

    #[tokio::test]
    async fn strict_resolvers_require_everything() {
        let resolver = VariableResolver::builder().strict(true).build();
        let err = resolve(&resolver, &StateMemory::new(), "{{anything}}")
            .await
            .expect_err("strict");
        assert!(matches!(err, TemplateError::MissingVariable { .. }));
    }

    #[tokio::test]
    async fn unclosed_references_are_unresolvable() {
        let resolver = VariableResolver::new();
        let err = resolve(&resolver, &StateMemory::new(), "Hello {{name")
            .await
            .expect_err("unclosed");
        assert!(matches!(err, TemplateError::Unresolvable { .. }));
    }

    #[tokio::test]
    async fn plain_text_passes_through() {
        let resolver = VariableResolver::new();
        let rendered = resolve(&resolver, &StateMemory::new(), "Hello World").await.unwrap();
        assert_eq!(rendered, "Hello World");
    }
}
