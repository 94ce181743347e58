//! Core shared types and traits for sectioned prompt rendering.

#![warn(missing_docs, clippy::pedantic)]

mod context;
mod error;
mod ids;
mod memory;
mod message;

/// Opaque per-turn conversational context handed to every render call.
pub use context::TurnContext;
/// Error type and result alias shared across the workspace.
pub use error::{PrimitiveError, Result};
/// Identifier of the conversation a turn belongs to.
pub use ids::ConversationId;
/// Read-only state access used while rendering, plus an in-process store.
pub use memory::{Memory, StateMemory, DEFAULT_SCOPE};
/// Role-tagged chat messages.
pub use message::{Message, MessageRole};
