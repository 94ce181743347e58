//! Post-hoc validation of model responses.

use async_trait::async_trait;
use prompt_primitives::{Memory, Message, TurnContext};
use prompt_tokenizers::Tokenizer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of validating a response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the response is acceptable.
    pub valid: bool,
    /// Value extracted from the response, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Feedback to send back to the model when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Validation {
    /// A passing validation without a value.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// A passing validation carrying an extracted value.
    #[must_use]
    pub fn with_value(value: Value) -> Self {
        Self {
            valid: true,
            value: Some(value),
            feedback: None,
        }
    }

    /// A failing validation with feedback for the model.
    #[must_use]
    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self {
            valid: false,
            value: None,
            feedback: Some(feedback.into()),
        }
    }
}

/// Checks a model response before it is accepted.
#[async_trait]
pub trait ResponseValidator: Send + Sync {
    /// Validates `response`; `remaining_attempts` counts the retries left.
    async fn validate_response(
        &self,
        context: &TurnContext,
        memory: &dyn Memory,
        tokenizer: &dyn Tokenizer,
        response: &Message,
        remaining_attempts: u32,
    ) -> Validation;
}

/// Accepts every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseValidator;

#[async_trait]
impl ResponseValidator for DefaultResponseValidator {
    async fn validate_response(
        &self,
        _context: &TurnContext,
        _memory: &dyn Memory,
        _tokenizer: &dyn Tokenizer,
        _response: &Message,
        _remaining_attempts: u32,
    ) -> Validation {
        Validation::valid()
    }
}
