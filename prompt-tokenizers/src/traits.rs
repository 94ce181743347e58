//! The tokenizer capability shared by every section.

use thiserror::Error;

/// A single token identifier.
pub type Token = u32;

/// Result alias used by tokenizers.
pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Errors produced by tokenizer implementations.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The BPE ranks for an encoding could not be loaded.
    #[error("failed to load `{encoding}` encoding: {reason}")]
    Load {
        /// Encoding name.
        encoding: &'static str,
        /// Loader error message.
        reason: String,
    },

    /// The token sequence does not decode to valid UTF-8 text.
    #[error("token sequence of length {len} does not decode to text: {reason}")]
    Decode {
        /// Number of tokens supplied.
        len: usize,
        /// Decoder error message.
        reason: String,
    },

    /// The encoding name was not recognised.
    #[error("unknown encoding `{0}`")]
    UnknownEncoding(String),
}

/// Pure, synchronous token encoder/decoder.
///
/// Implementations must not keep counting state between calls: the same text
/// always yields the same tokens.
pub trait Tokenizer: Send + Sync {
    /// Encodes text into tokens.
    fn encode(&self, text: &str) -> Vec<Token>;

    /// Decodes tokens back into text.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Decode`] when the tokens split a character.
    fn decode(&self, tokens: &[Token]) -> TokenizerResult<String>;

    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Returns the longest token prefix of `text` that decodes cleanly and
    /// re-measures to at most `max_tokens`.
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.encode(text);
        if tokens.len() <= max_tokens {
            return text.to_owned();
        }

        let mut take = max_tokens;
        while take > 0 {
            if let Ok(candidate) = self.decode(&tokens[..take]) {
                if self.count(&candidate) <= max_tokens {
                    return candidate;
                }
            }
            take -= 1;
        }
        String::new()
    }
}
