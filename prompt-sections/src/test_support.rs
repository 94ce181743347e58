//! Shared fixtures for unit tests.

use prompt_primitives::{StateMemory, TurnContext};
use prompt_templates::VariableResolver;
use prompt_tokenizers::ByteTokenizer;
use serde_json::Value;

use crate::section::RenderScope;

pub(crate) struct Fixture {
    pub(crate) context: TurnContext,
    pub(crate) memory: StateMemory,
    pub(crate) resolver: VariableResolver,
    pub(crate) tokenizer: ByteTokenizer,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_resolver(VariableResolver::new())
    }

    pub(crate) fn strict() -> Self {
        Self::with_resolver(VariableResolver::builder().strict(true).build())
    }

    fn with_resolver(resolver: VariableResolver) -> Self {
        Self {
            context: TurnContext::default(),
            memory: StateMemory::new(),
            resolver,
            tokenizer: ByteTokenizer::new(),
        }
    }

    pub(crate) fn scope(&self) -> RenderScope<'_> {
        RenderScope::new(&self.context, &self.memory, &self.resolver, &self.tokenizer)
    }

    pub(crate) async fn set(&self, key: &str, value: impl Into<Value>) {
        self.memory.set(key, value.into()).await.expect("valid key");
    }
}
