//! Leaf section with static text.

use async_trait::async_trait;
use prompt_primitives::{Message, MessageRole};

use crate::error::RenderResult;
use crate::props::{SectionProps, section_props_builders};
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::shape::{cap_messages, cap_text, messages_result, messages_to_text, text_result};
use crate::sizing::Sizing;

/// A fixed piece of text that needs no resolution.
#[derive(Clone, Debug)]
pub struct TextSection {
    text: String,
    role: MessageRole,
    props: SectionProps,
}

impl TextSection {
    /// Creates a required, automatically sized section.
    #[must_use]
    pub fn new(text: impl Into<String>, role: MessageRole) -> Self {
        Self {
            text: text.into(),
            role,
            props: SectionProps::new("\n", ""),
        }
    }

    /// Returns the text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }
}

section_props_builders!(TextSection);

#[async_trait]
impl PromptSection for TextSection {
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
        let message = Message::new(self.role, self.text.clone());
        let text = messages_to_text(&self.props.text_prefix, &[message], &self.props.separator);
        let text = cap_text(text, self.props.sizing, scope.tokenizer);
        Ok(text_result(text, scope.tokenizer, max_tokens))
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        let messages = cap_messages(
            vec![Message::new(self.role, self.text.clone())],
            self.props.sizing,
            scope.tokenizer,
        );
        Ok(messages_result(messages, scope.tokenizer, max_tokens))
    }
}
