//! Result of rendering a section.

use serde::{Deserialize, Serialize};

/// Output of a render call together with its measured size.
///
/// `length` is always measured from `output` with the tokenizer of the call:
/// the token count of the string in text mode, the sum of the content token
/// counts in message mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSection<T> {
    /// Rendered text or messages.
    pub output: T,
    /// Token length of `output`.
    pub length: usize,
    /// True when `length` exceeds the budget given to the call, or a required
    /// descendant overflowed its own budget.
    pub too_long: bool,
}

impl<T> RenderedSection<T> {
    /// Builds a result, deriving `too_long` from the budget.
    #[must_use]
    pub fn new(output: T, length: usize, max_tokens: usize) -> Self {
        Self {
            output,
            length,
            too_long: length > max_tokens,
        }
    }
}
