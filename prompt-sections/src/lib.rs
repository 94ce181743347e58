//! Token-budgeted rendering of composable prompt sections.
//!
//! A prompt is a tree of [`PromptSection`]s. Leaves resolve their content
//! through a template resolver; containers ([`LayoutEngine`], [`Prompt`],
//! [`GroupSection`]) split the budget they are given between their children
//! and assemble the results. Every tree can be projected either to a single
//! string or to a list of role-tagged messages, and both projections report
//! lengths measured with the same tokenizer.

#![warn(missing_docs, clippy::pedantic)]

pub mod allocation;
pub mod error;
pub mod group;
pub mod history;
pub mod layout;
pub mod prompt;
pub mod props;
pub mod rendered;
pub mod section;
pub mod shape;
pub mod sizing;
pub mod template_section;
pub mod text_section;

#[cfg(test)]
mod test_support;

pub use allocation::AllocationPlan;
pub use error::{RenderError, RenderResult};
pub use group::GroupSection;
pub use history::ConversationHistory;
pub use layout::LayoutEngine;
pub use prompt::Prompt;
pub use props::SectionProps;
pub use rendered::RenderedSection;
pub use section::{PromptSection, RenderScope};
pub use sizing::Sizing;
pub use template_section::TemplateSection;
pub use text_section::TextSection;
