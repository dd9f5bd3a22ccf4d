//! Conversation data model.
//!
//! A [`Transcript`] is the ordered conversation history exchanged with a
//! provider. It is append-only with one exception: while a response streams,
//! the single in-flight assistant message grows in place. Once the stream
//! ends that message is as immutable as the rest; the mutation hooks are
//! crate-private and only the accumulator holds them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant role for a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered conversation history. Array order is conversation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed message.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Total character count across all message contents.
    ///
    /// Used for the prompt side of the usage estimate; characters, not bytes,
    /// so multi-byte text is not over-counted.
    pub fn content_chars(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.content.chars().count())
            .sum()
    }

    /// Append the empty assistant placeholder for an incoming stream and
    /// return its slot index.
    pub(crate) fn begin_assistant(&mut self) -> usize {
        self.messages.push(ChatMessage::new(Role::Assistant, ""));
        self.messages.len() - 1
    }

    /// Append a fragment to the in-flight assistant message at `slot`.
    pub(crate) fn append_fragment(&mut self, slot: usize, fragment: &str) {
        self.messages[slot].content.push_str(fragment);
    }
}
