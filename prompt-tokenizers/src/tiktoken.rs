//! BPE tokenizers backed by `tiktoken-rs`.

use std::sync::OnceLock;

use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, r50k_base};
use tracing::debug;

use crate::encoding::Encoding;
use crate::traits::{Token, Tokenizer, TokenizerError, TokenizerResult};

static CL100K: OnceLock<CoreBPE> = OnceLock::new();
static O200K: OnceLock<CoreBPE> = OnceLock::new();
static P50K: OnceLock<CoreBPE> = OnceLock::new();
static R50K: OnceLock<CoreBPE> = OnceLock::new();

/// Tokenizer using one of the OpenAI BPE encodings.
///
/// Ranks are loaded once per process and shared between instances.
#[derive(Clone, Copy)]
pub struct TiktokenTokenizer {
    encoding: Encoding,
    bpe: &'static CoreBPE,
}

impl std::fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl TiktokenTokenizer {
    /// Loads the tokenizer for a BPE encoding.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Load`] if the ranks cannot be loaded, or
    /// [`TokenizerError::UnknownEncoding`] for [`Encoding::Bytes`].
    pub fn new(encoding: Encoding) -> TokenizerResult<Self> {
        let cell = match encoding {
            Encoding::Cl100kBase => &CL100K,
            Encoding::O200kBase => &O200K,
            Encoding::P50kBase => &P50K,
            Encoding::R50kBase => &R50K,
            Encoding::Bytes => {
                return Err(TokenizerError::UnknownEncoding(encoding.name().to_owned()));
            }
        };

        if cell.get().is_none() {
            debug!(encoding = encoding.name(), "loading bpe ranks");
            let _ = cell.set(load_ranks(encoding)?);
        }

        let bpe = cell.get().ok_or_else(|| TokenizerError::Load {
            encoding: encoding.name(),
            reason: "ranks were not initialised".into(),
        })?;

        Ok(Self { encoding, bpe })
    }

    /// Tokenizer matching the GPT-3 family (`r50k_base`).
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Load`] if the ranks cannot be loaded.
    pub fn gpt3() -> TokenizerResult<Self> {
        Self::new(Encoding::R50kBase)
    }

    /// Returns the encoding this tokenizer uses.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }
}

fn load_ranks(encoding: Encoding) -> TokenizerResult<CoreBPE> {
    let loaded = match encoding {
        Encoding::Cl100kBase => cl100k_base(),
        Encoding::O200kBase => o200k_base(),
        Encoding::P50kBase => p50k_base(),
        Encoding::R50kBase => r50k_base(),
        Encoding::Bytes => {
            return Err(TokenizerError::UnknownEncoding(encoding.name().to_owned()));
        }
    };

    loaded.map_err(|err| TokenizerError::Load {
        encoding: encoding.name(),
        reason: err.to_string(),
    })
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Vec<Token> {
        self.bpe.encode_with_special_tokens(text)
    }

    fn decode(&self, tokens: &[Token]) -> TokenizerResult<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|err| TokenizerError::Decode {
                len: tokens.len(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt3_counts_hello_world_as_two_tokens() {
        let tokenizer = TiktokenTokenizer::gpt3().expect("ranks");
        assert_eq!(tokenizer.count("Hello World"), 2);
    }

    #[test]
    fn round_trips_text() {
        let tokenizer = TiktokenTokenizer::new(Encoding::Cl100kBase).expect("ranks");
        let tokens = tokenizer.encode("rendering under a budget");
        assert_eq!(tokenizer.decode(&tokens).unwrap(), "rendering under a budget");
    }

    #[test]
    fn truncation_respects_limit() {
        let tokenizer = TiktokenTokenizer::new(Encoding::Cl100kBase).expect("ranks");
        let truncated = tokenizer.truncate("one two three four five six", 3);
        assert!(tokenizer.count(&truncated) <= 3);
        assert!("one two three four five six".starts_with(&truncated));
    }

    #[test]
    fn bytes_is_not_a_bpe_encoding() {
        let err = TiktokenTokenizer::new(Encoding::Bytes).expect_err("not bpe");
        assert!(matches!(err, TokenizerError::UnknownEncoding(_)));
    }
}
