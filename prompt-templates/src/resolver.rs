//! The resolution capability sections call into.

use async_trait::async_trait;
use prompt_primitives::{Memory, TurnContext};

use crate::template::TemplateResult;

/// Turns a leaf's raw template into finished text.
///
/// This is the only capability a render call is allowed to fail on.
#[async_trait]
pub trait TemplateResolver: Send + Sync {
    /// Resolves `template` against the current turn and memory.
    async fn resolve(
        &self,
        template: &str,
        context: &TurnContext,
        memory: &dyn Memory,
    ) -> TemplateResult<String>;
}

/// Resolver that returns templates unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralResolver;

#[async_trait]
impl TemplateResolver for LiteralResolver {
    async fn resolve(
        &self,
        template: &str,
        _context: &TurnContext,
        _memory: &dyn Memory,
    ) -> TemplateResult<String> {
        Ok(template.to_owned())
    }
}
