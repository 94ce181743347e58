//! Root of a render tree.

use async_trait::async_trait;
use prompt_primitives::Message;

use crate::error::RenderResult;
use crate::layout::LayoutEngine;
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::sizing::Sizing;

/// Top-level prompt: a [`LayoutEngine`] that separates its sections with a
/// blank line, sizes automatically, and is required.
///
/// Prompts nest like any other section.
#[derive(Debug)]
pub struct Prompt {
    layout: LayoutEngine,
}

impl Prompt {
    /// Creates a prompt over `sections`.
    #[must_use]
    pub fn new(sections: Vec<Box<dyn PromptSection>>) -> Self {
        Self {
            layout: LayoutEngine::new(sections).with_separator("\n\n"),
        }
    }

    /// Appends a section.
    #[must_use]
    pub fn with_section(mut self, section: impl PromptSection + 'static) -> Self {
        self.layout = self.layout.with_section(section);
        self
    }

    /// Sets the sizing policy used when the prompt is nested.
    #[must_use]
    pub fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.layout = self.layout.with_sizing(sizing);
        self
    }

    /// Sets whether the prompt must appear when nested.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.layout = self.layout.with_required(required);
        self
    }

    /// Sets the text-mode separator.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.layout = self.layout.with_separator(separator);
        self
    }

    /// Returns the sections of the prompt.
    #[must_use]
    pub fn sections(&self) -> &[Box<dyn PromptSection>] {
        self.layout.sections()
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl PromptSection for Prompt {
    fn sizing(&self) -> Sizing {
        self.layout.sizing()
    }

    fn required(&self) -> bool {
        self.layout.required()
    }

    fn separator(&self) -> &str {
        self.layout.separator()
    }

    async fn render_as_text(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        self.layout.render_as_text(scope, max_tokens).await
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        self.layout.render_as_messages(scope, max_tokens).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_section::TemplateSection;
    use crate::test_support::Fixture;

    #[test]
    fn defaults() {
        let prompt = Prompt::default();
        assert_eq!(prompt.sizing(), Sizing::Auto);
        assert!(prompt.required());
        assert_eq!(prompt.separator(), "\n\n");
        assert!(prompt.sections().is_empty());
    }

    #[tokio::test]
    async fn joins_sections_with_blank_lines() {
        let fixture = Fixture::new();
        let prompt = Prompt::default()
            .with_section(TemplateSection::system("Be brief."))
            .with_section(TemplateSection::user("Hello World"));

        let text = prompt.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(text.output, "Be brief.\n\nuser: Hello World");
        assert_eq!(text.length, 28);
        assert!(!text.too_long);

        let messages = prompt.render_as_messages(fixture.scope(), 100).await.unwrap();
        assert_eq!(
            messages.output,
            vec![Message::system("Be brief."), Message::user("Hello World")]
        );
        assert_eq!(messages.length, 20);
    }

    #[tokio::test]
    async fn nested_prompts_render_like_sections() {
        let fixture = Fixture::new();
        let inner = Prompt::default()
            .with_section(TemplateSection::user("a"))
            .with_section(TemplateSection::assistant("b"));
        let outer = Prompt::default()
            .with_section(TemplateSection::system("sys"))
            .with_section(inner);

        let text = outer.render_as_text(fixture.scope(), 100).await.unwrap();
        assert_eq!(text.output, "sys\n\nuser: a\n\nassistant: b");
        assert_eq!(text.length, text.output.len());
    }
}
