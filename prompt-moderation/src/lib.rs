//! Review of rendered prompts and model responses.
//!
//! Rendering never depends on this crate. Moderators consume rendered input
//! or model output and report flags against a discrete severity taxonomy;
//! response validators check model output after the fact.

#![warn(missing_docs, clippy::pedantic)]

pub mod category;
pub mod moderator;
pub mod policy;
pub mod validator;

pub use category::{CategoryThreshold, ModerationCategory, Severity};
pub use moderator::{
    CategoryAnalysis, ContentAnalyzer, ModerationAction, ModerationError, ModerationTarget,
    ModerationVerdict, Moderator, PolicyModerator, ReviewResult,
};
pub use policy::{CategoryFlag, ModerationPolicy, ModerationResult};
pub use validator::{DefaultResponseValidator, ResponseValidator, Validation};
