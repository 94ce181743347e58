//! Leaf section that replays the conversation stored in memory.

use std::collections::VecDeque;

use async_trait::async_trait;
use prompt_primitives::{Memory, Message, MessageRole};
use prompt_tokenizers::Tokenizer;
use tracing::warn;

use crate::error::RenderResult;
use crate::props::{SectionProps, section_props_builders};
use crate::rendered::RenderedSection;
use crate::section::{PromptSection, RenderScope};
use crate::shape::{cap_messages, cap_text, join_text, messages_result, text_result};
use crate::sizing::Sizing;

/// Memory key the history is read from unless configured otherwise.
pub const DEFAULT_HISTORY_KEY: &str = "conversation.history";

/// Recent turns of the conversation, newest kept first.
///
/// The history is a JSON array of `{ "role", "content" }` objects. Turns are
/// taken newest-first while they fit the budget and emitted oldest-first. A
/// required history always keeps its newest turn. Missing history renders
/// empty, as does malformed history (after a warning).
#[derive(Clone, Debug)]
pub struct ConversationHistory {
    memory_key: String,
    user_prefix: String,
    assistant_prefix: String,
    props: SectionProps,
}

impl ConversationHistory {
    /// Creates an optional, automatically sized history over `memory_key`.
    #[must_use]
    pub fn new(memory_key: impl Into<String>) -> Self {
        let mut props = SectionProps::new("\n", "");
        props.required = false;
        Self {
            memory_key: memory_key.into(),
            user_prefix: "user: ".to_owned(),
            assistant_prefix: "assistant: ".to_owned(),
            props,
        }
    }

    /// Sets the text-mode prefix for user turns.
    #[must_use]
    pub fn with_user_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_prefix = prefix.into();
        self
    }

    /// Sets the text-mode prefix for assistant turns.
    #[must_use]
    pub fn with_assistant_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.assistant_prefix = prefix.into();
        self
    }

    /// Returns the memory key the history is read from.
    #[must_use]
    pub fn memory_key(&self) -> &str {
        &self.memory_key
    }

    async fn load(&self, memory: &dyn Memory) -> Vec<Message> {
        let Some(value) = memory.get(&self.memory_key).await else {
            return Vec::new();
        };

        serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(key = %self.memory_key, error = %err, "ignoring malformed conversation history");
            Vec::new()
        })
    }

    fn line(&self, message: &Message) -> String {
        match message.role() {
            MessageRole::User => format!("{}{}", self.user_prefix, message.content()),
            MessageRole::Assistant => format!("{}{}", self.assistant_prefix, message.content()),
            role => format!("{role}: {}", message.content()),
        }
    }

    /// Walks `items` newest-first, keeping those whose cost fits `budget`.
    fn fit_newest<T>(
        &self,
        items: Vec<T>,
        budget: usize,
        cost: impl Fn(&T, bool) -> usize,
    ) -> Vec<T> {
        let mut kept = VecDeque::new();
        let mut used = 0;
        for item in items.into_iter().rev() {
            let item_cost = cost(&item, kept.is_empty());
            if kept.is_empty() && self.props.required {
                used += item_cost;
                kept.push_front(item);
                continue;
            }
            if used + item_cost > budget {
                break;
            }
            used += item_cost;
            kept.push_front(item);
        }
        kept.into()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_KEY)
    }
}

section_props_builders!(ConversationHistory);

#[async_trait]
impl PromptSection for ConversationHistory {
    fn sizing(&self) -> Sizing {
        self.props.sizing
    }

    fn required(&self) -> bool {
        self.props.required
    }

    fn separator(&self) -> &str {
        &self.props.separator
    }

    async fn render_as_text(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<String>> {
        let tokenizer: &dyn Tokenizer = scope.tokenizer;
        let budget = self
            .props
            .sizing
            .cap(max_tokens)
            .saturating_sub(tokenizer.count(&self.props.text_prefix));
        let separator_cost = tokenizer.count(&self.props.separator);

        let lines: Vec<String> = self
            .load(scope.memory)
            .await
            .iter()
            .map(|message| self.line(message))
            .collect();
        let lines = self.fit_newest(lines, budget, |line, first| {
            tokenizer.count(line) + if first { 0 } else { separator_cost }
        });

        let text = join_text(
            &self.props.text_prefix,
            lines.iter().map(String::as_str),
            &self.props.separator,
        );
        let text = cap_text(text, self.props.sizing, tokenizer);
        Ok(text_result(text, tokenizer, max_tokens))
    }

    async fn render_as_messages(
        &self,
        scope: RenderScope<'_>,
        max_tokens: usize,
    ) -> RenderResult<RenderedSection<Vec<Message>>> {
        let tokenizer: &dyn Tokenizer = scope.tokenizer;
        let budget = self.props.sizing.cap(max_tokens);

        let history = self.load(scope.memory).await;
        let messages = self.fit_newest(history, budget, |message, _| {
            tokenizer.count(message.content())
        });

        let messages = cap_messages(messages, self.props.sizing, tokenizer);
        Ok(messages_result(messages, tokenizer, max_tokens))
    }
}
