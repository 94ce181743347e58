//! Token-budgeted rendering of hierarchical prompt sections.
//!
//! This facade bundles the workspace crates. The rendering core is always
//! available; moderation, configuration and telemetry sit behind features
//! that are enabled by default.
//!
//! ```no_run
//! use sectioned_prompts::prelude::*;
//!
//! # async fn demo() -> Result<(), RenderError> {
//! let prompt = Prompt::default()
//!     .with_section(TemplateSection::system("You are terse."))
//!     .with_section(TemplateSection::user("{{question}}"));
//!
//! let context = TurnContext::default();
//! let memory = StateMemory::new();
//! let resolver = VariableResolver::new();
//! let tokenizer = ByteTokenizer::new();
//! let scope = RenderScope::new(&context, &memory, &resolver, &tokenizer);
//!
//! let rendered = prompt.render_as_messages(scope, 100).await?;
//! assert!(!rendered.too_long);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Messages, context and memory.
pub use prompt_primitives as primitives;

/// Tokenizers.
pub use prompt_tokenizers as tokenizers;

/// Template resolution.
pub use prompt_templates as templates;

/// Sections, layouts and rendering.
pub use prompt_sections as sections;

/// Moderation and response validation (enabled by `moderation` feature).
#[cfg(feature = "moderation")]
pub use prompt_moderation as moderation;

/// TOML configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use prompt_config as config;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use prompt_telemetry as telemetry;

/// Types needed to build and render a prompt.
pub mod prelude {
    pub use prompt_primitives::{Memory, Message, MessageRole, StateMemory, TurnContext};
    pub use prompt_sections::{
        ConversationHistory, GroupSection, LayoutEngine, Prompt, PromptSection, RenderError,
        RenderResult, RenderScope, RenderedSection, Sizing, TemplateSection, TextSection,
    };
    pub use prompt_templates::{LiteralResolver, TemplateResolver, VariableResolver};
    pub use prompt_tokenizers::{ByteTokenizer, Encoding, TiktokenTokenizer, Tokenizer};
}
