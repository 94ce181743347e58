//! Shared error definitions for prompt primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used by the primitives crate.
pub type Result<T> = std::result::Result<T, PrimitiveError>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// The provided conversation identifier could not be parsed.
    #[error("invalid conversation id: {source}")]
    InvalidConversationId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// A memory key failed validation.
    #[error("invalid memory key `{key}`: {reason}")]
    InvalidMemoryKey {
        /// The offending key.
        key: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A message role string was not recognised.
    #[error("unknown message role `{0}`")]
    UnknownRole(String),
}
