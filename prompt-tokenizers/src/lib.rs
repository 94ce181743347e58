//! Tokenizers used to measure and truncate rendered prompt output.
//!
//! Every length reported by the renderer is traceable to a [`Tokenizer`];
//! nothing in the workspace invents its own counting heuristic.

#![warn(missing_docs, clippy::pedantic)]

pub mod bytes;
pub mod encoding;
pub mod tiktoken;
pub mod traits;

pub use bytes::ByteTokenizer;
pub use encoding::{Encoding, build_tokenizer};
pub use tiktoken::TiktokenTokenizer;
pub use traits::{Token, Tokenizer, TokenizerError, TokenizerResult};
