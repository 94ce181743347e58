//! Encoding selection and tokenizer construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bytes::ByteTokenizer;
use crate::tiktoken::TiktokenTokenizer;
use crate::traits::{Tokenizer, TokenizerError, TokenizerResult};

/// Token encodings supported by [`build_tokenizer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One token per UTF-8 byte.
    Bytes,
    /// GPT-3.5 / GPT-4 encoding.
    #[default]
    Cl100kBase,
    /// GPT-4o encoding.
    O200kBase,
    /// Codex encoding.
    P50kBase,
    /// GPT-3 encoding.
    R50kBase,
}

impl Encoding {
    /// Returns the canonical encoding name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::P50kBase => "p50k_base",
            Self::R50kBase => "r50k_base",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bytes" => Ok(Self::Bytes),
            "cl100k_base" => Ok(Self::Cl100kBase),
            "o200k_base" => Ok(Self::O200kBase),
            "p50k_base" => Ok(Self::P50kBase),
            "r50k_base" | "gpt3" => Ok(Self::R50kBase),
            other => Err(TokenizerError::UnknownEncoding(other.to_owned())),
        }
    }
}

/// Builds a shareable tokenizer for the encoding.
///
/// # Errors
///
/// Returns [`TokenizerError::Load`] when BPE ranks cannot be loaded.
pub fn build_tokenizer(encoding: Encoding) -> TokenizerResult<Arc<dyn Tokenizer>> {
    match encoding {
        Encoding::Bytes => Ok(Arc::new(ByteTokenizer::new())),
        bpe => Ok(Arc::new(TiktokenTokenizer::new(bpe)?)),
    }
}
