//! Lossless byte-level tokenizer.

use crate::traits::{Token, Tokenizer, TokenizerError, TokenizerResult};

/// Treats every UTF-8 byte as one token.
///
/// Counts are additive under concatenation, which makes this tokenizer the
/// reference for exact budget arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteTokenizer;

impl ByteTokenizer {
    /// Creates the tokenizer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str) -> Vec<Token> {
        text.bytes().map(Token::from).collect()
    }

    fn decode(&self, tokens: &[Token]) -> TokenizerResult<String> {
        let bytes = tokens
            .iter()
            .map(|&token| {
                u8::try_from(token).map_err(|_| TokenizerError::Decode {
                    len: tokens.len(),
                    reason: format!("token {token} is not a byte"),
                })
            })
            .collect::<TokenizerResult<Vec<u8>>>()?;

        String::from_utf8(bytes).map_err(|err| TokenizerError::Decode {
            len: tokens.len(),
            reason: err.to_string(),
        })
    }

    fn count(&self, text: &str) -> usize {
        text.len()
    }
}
