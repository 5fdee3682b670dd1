//! Conversation message types.
//!
//! A message is an ordered sequence of parts. Each part is either text or an
//! inline binary attachment (MIME type plus base64 payload). A streaming
//! model message starts as a single empty text part and grows in place; parts
//! are never removed while a stream is active.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the generative model.
    Model,
}

/// One part of a message: text or an inline attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    InlineData {
        mime_type: String,
        /// Base64-encoded payload.
        data: String,
    },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

/// A single message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// Ordered message parts.
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn new(role: MessageRole, parts: Vec<MessagePart>) -> Self {
        Self { role, parts }
    }

    /// A user message from arbitrary parts.
    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self::new(MessageRole::User, parts)
    }

    /// A model message holding a single text part.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, vec![MessagePart::text(text)])
    }

    /// An empty model message, the seed a streaming response grows into.
    pub fn model_empty() -> Self {
        Self::model_text("")
    }

    /// Concatenated content of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(MessagePart::as_text)
            .collect()
    }

    /// Extends the first text part in place.
    ///
    /// This is the streaming growth path: the message object itself is
    /// mutated, never replaced, so observers see incremental extension of one
    /// message rather than a sequence of unrelated ones. A text part is
    /// created if the message has none; no part is ever removed.
    pub fn append_text(&mut self, fragment: &str) {
        for part in &mut self.parts {
            if let MessagePart::Text { text } = part {
                text.push_str(fragment);
                return;
            }
        }
        self.parts.push(MessagePart::text(fragment));
    }
}
