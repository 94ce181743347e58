//! Leaf section whose content comes from a template.

use async_trait::async_trait;
use prompt_primitives::{Message, MessageRole};

use crate::error::{RenderError, RenderResult};
use crate::props::{SectionProps, section_props_builders};
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::shape::{cap_messages, cap_text, messages_result, messages_to_text, text_result};
use crate::sizing::Sizing;

/// A single message resolved from a template.
///
/// In text mode the content is emitted behind the section's text prefix and
/// the prefix counts toward the length; in message mode the role travels as
/// metadata and only the content is counted.
#[derive(Clone, Debug)]
pub struct TemplateSection {
    template: String,
    role: MessageRole,
    props: SectionProps,
}

impl TemplateSection {
    /// Creates a section with automatic sizing, required, a newline
    /// separator and no text prefix.
    #[must_use]
    pub fn new(template: impl Into<String>, role: MessageRole) -> Self {
        Self {
            template: template.into(),
            role,
            props: SectionProps::new("\n", ""),
        }
    }

    /// A user message, prefixed `user: ` in text mode.
    #[must_use]
    pub fn user(template: impl Into<String>) -> Self {
        Self::new(template, MessageRole::User).with_text_prefix("user: ")
    }

    /// An assistant message, prefixed `assistant: ` in text mode.
    #[must_use]
    pub fn assistant(template: impl Into<String>) -> Self {
        Self::new(template, MessageRole::Assistant).with_text_prefix("assistant: ")
    }

    /// A system message, unprefixed in text mode.
    #[must_use]
    pub fn system(template: impl Into<String>) -> Self {
        Self::new(template, MessageRole::System)
    }

    /// Returns the raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    async fn resolve(&self, scope: RenderScope<'_>) -> RenderResult<String> {
        scope
            .resolver
            .resolve(&self.template, scope.context, scope.memory)
            .await
            .map_err(|source| RenderError::template(&self.template, source))
    }
}

section_props_builders!(TemplateSection);

#[async_trait]
impl PromptSection for TemplateSection {
    fn sizing(&self) -> Sizing {
        self.props.sizing
    }

    fn required(&self) -> bool {
        self.props.required
    }

    fn separator(&self) -> &str {
        &self.props.separator
    }

    async fn render_as_text(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        let content = self.resolve(scope).await?;
        let message = Message::new(self.role, content);
        let text = messages_to_text(&self.props.text_prefix, &[message], &self.props.separator);
        let text = cap_text(text, self.props.sizing, scope.tokenizer);
        Ok(text_result(text, scope.tokenizer, max_tokens))
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        let content = self.resolve(scope).await?;
        let messages = cap_messages(
            vec![Message::new(self.role, content)],
            self.props.sizing,
            scope.tokenizer,
        );
        Ok(messages_result(messages, scope.tokenizer, max_tokens))
    }
}
