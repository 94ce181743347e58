//! Template resolution for leaf prompt sections.

#![warn(missing_docs, clippy::pedantic)]

pub mod resolver;
pub mod template;

pub use resolver::{LiteralResolver, TemplateResolver};
pub use template::{TemplateError, TemplateResult, VariableResolver, VariableResolverBuilder};
