//! The contract every section implements.

use async_trait::async_trait;
use prompt_primitives::{Memory, Message, TurnContext};
use prompt_templates::TemplateResolver;
use prompt_tokenizers::Tokenizer;

use crate::error::RenderResult;
use crate::rendered::RenderedSection;
use crate::sizing::Sizing;

/// Capabilities shared by every render call in a tree.
///
/// All of them are read-only; a scope is copied down each branch of the tree.
#[derive(Clone, Copy)]
pub struct RenderScope<'a> {
    /// Conversational context for the turn.
    pub context: &'a TurnContext,
    /// State lookups.
    pub memory: &'a dyn Memory,
    /// Template resolution for leaves.
    pub resolver: &'a dyn TemplateResolver,
    /// Token measurement.
    pub tokenizer: &'a dyn Tokenizer,
}

impl<'a> RenderScope<'a> {
    /// Bundles the render capabilities.
    #[must_use]
    pub fn new(
        context: &'a TurnContext,
        memory: &'a dyn Memory,
        resolver: &'a dyn TemplateResolver,
        tokenizer: &'a dyn Tokenizer,
    ) -> Self {
        Self {
            context,
            memory,
            resolver,
            tokenizer,
        }
    }
}

impl std::fmt::Debug for RenderScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScope")
            .field("context", self.context)
            .finish_non_exhaustive()
    }
}

/// A unit of a prompt tree, leaf or container.
///
/// Rendering takes `&self`: a tree is immutable while it renders and can be
/// rendered again with another budget or scope.
#[async_trait]
pub trait PromptSection: Send + Sync {
    /// Budget policy the parent container applies to this section.
    fn sizing(&self) -> Sizing;

    /// Whether the section must appear even when it overflows.
    fn required(&self) -> bool;

    /// Separator placed between pieces of output in text mode.
    fn separator(&self) -> &str;

    /// Renders the section to a single string.
    async fn render_as_text(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>>;

    /// Renders the section to role-tagged messages.
    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>>;
}
