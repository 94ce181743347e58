//! Helpers that keep the text and message projections consistent.
//!
//! Text length is the token count of the final string, prefix and separators
//! included. Message length is the sum of the content token counts; roles are
//! metadata and cost nothing.

use prompt_primitives::Message;
use prompt_tokenizers::Tokenizer;

use crate::rendered::RenderedSection;
use crate::sizing::Sizing;

/// Joins message contents with `separator` behind `prefix`.
///
/// No messages yields an empty string, without the prefix.
#[must_use]
pub fn messages_to_text(prefix: &str, messages: &[Message], separator: &str) -> String {
    join_text(prefix, messages.iter().map(Message::content), separator)
}

/// Joins pieces of text with `separator` behind `prefix`.
#[must_use]
pub fn join_text<'a>(
    prefix: &str,
    parts: impl IntoIterator<Item = &'a str>,
    separator: &str,
) -> String {
    let mut parts = parts.into_iter().peekable();
    if parts.peek().is_none() {
        return String::new();
    }

    let mut text = String::from(prefix);
    for (idx, part) in parts.enumerate() {
        if idx > 0 {
            text.push_str(separator);
        }
        text.push_str(part);
    }
    text
}

/// Token length of a message list.
#[must_use]
pub fn measure_messages(messages: &[Message], tokenizer: &dyn Tokenizer) -> usize {
    messages
        .iter()
        .map(|message| tokenizer.count(message.content()))
        .sum()
}

/// Truncates text to a fixed sizing's token limit.
#[must_use]
pub fn cap_text(text: String, sizing: Sizing, tokenizer: &dyn Tokenizer) -> String {
    match sizing.hard_limit() {
        Some(limit) if tokenizer.count(&text) > limit => tokenizer.truncate(&text, limit),
        _ => text,
    }
}

/// Truncates messages to a fixed sizing's token limit.
///
/// Messages are kept from the front; the message that crosses the limit is
/// cut and everything after it is dropped.
#[must_use]
pub fn cap_messages(
    messages: Vec<Message>,
    sizing: Sizing,
    tokenizer: &dyn Tokenizer,
) -> Vec<Message> {
    let Some(limit) = sizing.hard_limit() else {
        return messages;
    };

    let mut kept = Vec::with_capacity(messages.len());
    let mut used = 0;
    for message in messages {
        let length = tokenizer.count(message.content());
        if used + length <= limit {
            used += length;
            kept.push(message);
            continue;
        }

        let truncated = tokenizer.truncate(message.content(), limit - used);
        if !truncated.is_empty() {
            kept.push(Message::new(message.role(), truncated));
        }
        break;
    }
    kept
}

/// Measures text and wraps it as a render result.
#[must_use]
pub fn text_result(
    text: String,
    tokenizer: &dyn Tokenizer,
    max_tokens: usize,
) -> RenderedSection<String> {
    let length = tokenizer.count(&text);
    RenderedSection::new(text, length, max_tokens)
}

/// Measures messages and wraps them as a render result.
#[must_use]
pub fn messages_result(
    messages: Vec<Message>,
    tokenizer: &dyn Tokenizer,
    max_tokens: usize,
) -> RenderedSection<Vec<Message>> {
    let length = measure_messages(&messages, tokenizer);
    RenderedSection::new(messages, length, max_tokens)
}
