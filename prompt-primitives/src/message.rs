//! Role-tagged chat messages produced by message-mode rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PrimitiveError;

/// Roles supported in chat-style prompts.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System messages steer the assistant behaviour.
    System,
    /// User-authored content.
    User,
    /// Assistant (model) responses.
    Assistant,
    /// Tool output fed back into the conversation.
    Tool,
}

impl MessageRole {
    /// Returns the lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(PrimitiveError::UnknownRole(other.to_owned())),
        }
    }
}

/// A single entry of a message-mode render.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Message {
    role: MessageRole,
    content: String,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Shorthand for a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Shorthand for an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Shorthand for a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    /// Returns the message content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consumes the message, returning its content.
    #[must_use]
    pub fn into_content(self) -> String {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_role_lowercase() {
        let json = serde_json::to_value(Message::user("Hello World")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "role": "user", "content": "Hello World" })
        );
    }

    #[test]
    fn parses_roles() {
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Assistant);
        assert!(matches!(
            "narrator".parse::<MessageRole>(),
            Err(PrimitiveError::UnknownRole(_))
        ));
    }
}
