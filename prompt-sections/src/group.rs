//! Container that renders its children as one message.

use async_trait::async_trait;
use prompt_primitives::{Message, MessageRole};

use crate::error::RenderResult;
use crate::layout::layout_text;
use crate::props::{SectionProps, section_props_builders};
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::shape::{cap_messages, cap_text, join_text, messages_result, text_result};
use crate::sizing::Sizing;

/// Lays its children out as text and emits the result as a single message.
///
/// Useful for folding several sections into one system message. Overflow of
/// a required child inside the group is reported through `too_long`, unless
/// a fixed sizing truncated the group to its limit.
pub struct GroupSection {
    sections: Vec<Box<dyn PromptSection>>,
    role: MessageRole,
    props: SectionProps,
}

impl GroupSection {
    /// Creates a required, automatically sized group joined by blank lines.
    #[must_use]
    pub fn new(sections: Vec<Box<dyn PromptSection>>, role: MessageRole) -> Self {
        Self {
            sections,
            role,
            props: SectionProps::new("\n\n", ""),
        }
    }

    /// Appends a child section.
    #[must_use]
    pub fn with_section(mut self, section: impl PromptSection + 'static) -> Self {
        self.sections.push(Box::new(section));
        self
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    async fn render_inner(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        layout_text(
            &self.sections,
            &self.props.separator,
            scope,
            self.props.sizing.cap(max_tokens),
        )
        .await
    }

    /// A fixed group truncates its content, so overflow inside it is already
    /// resolved by the cap.
    fn carries_overflow(&self, inner: &RenderedSection<String>) -> bool {
        inner.too_long && self.props.sizing.hard_limit().is_none()
    }
}

section_props_builders!(GroupSection);

impl std::fmt::Debug for GroupSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSection")
            .field("sections", &self.sections.len())
            .field("role", &self.role)
            .field("props", &self.props)
            .finish()
    }
}

#[async_trait]
impl PromptSection for GroupSection {
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
        let inner = self.render_inner(scope, max_tokens).await?;
        let parts = Some(inner.output.as_str()).filter(|text| !text.is_empty());
        let text = join_text(&self.props.text_prefix, parts, &self.props.separator);
        let text = cap_text(text, self.props.sizing, scope.tokenizer);

        let mut rendered = text_result(text, scope.tokenizer, max_tokens);
        rendered.too_long |= self.carries_overflow(&inner);
        Ok(rendered)
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        let inner = self.render_inner(scope, max_tokens).await?;
        let messages = if inner.output.is_empty() {
            Vec::new()
        } else {
            vec![Message::new(self.role, inner.output.clone())]
        };
        let messages = cap_messages(messages, self.props.sizing, scope.tokenizer);

        let mut rendered = messages_result(messages, scope.tokenizer, max_tokens);
        rendered.too_long |= self.carries_overflow(&inner);
        Ok(rendered)
    }
}
