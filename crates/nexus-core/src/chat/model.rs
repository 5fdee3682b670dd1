//! Chat session domain model.

use serde::{Deserialize, Serialize};

use super::id::SessionId;
use super::message::Message;
use crate::clock;

/// A persisted, named conversation thread.
///
/// A session references its persona and model profile by id, never by value;
/// the persona must be re-resolved on use so a deleted persona degrades to the
/// default. The message sequence is append-only during an exchange except for
/// the in-place growth of the final message while a response streams in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Time-ordered identifier; also the listing sort key.
    pub id: SessionId,
    /// Human-readable session name.
    pub name: String,
    /// Ordered conversation history.
    pub messages: Vec<Message>,
    /// Referenced persona id.
    pub persona_id: String,
    /// Referenced model profile id.
    pub model_id: String,
    /// Timestamp when the session was created (RFC 3339).
    pub created_at: String,
    /// Timestamp when the session was last updated (RFC 3339).
    pub updated_at: String,
}

impl ChatSession {
    /// Creates a session seeded with a model-authored welcome message.
    pub fn new(
        name: impl Into<String>,
        persona_id: impl Into<String>,
        model_id: impl Into<String>,
        welcome_message: impl Into<String>,
    ) -> Self {
        let now = clock::now_rfc3339();
        Self {
            id: SessionId::generate(),
            name: name.into(),
            messages: vec![Message::model_text(welcome_message)],
            persona_id: persona_id.into(),
            model_id: model_id.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Appends a message and refreshes the update timestamp.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// The final message, mutable, for in-place streaming growth.
    pub fn last_message_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut()
    }

    /// Refreshes the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = clock::now_rfc3339();
    }
}
