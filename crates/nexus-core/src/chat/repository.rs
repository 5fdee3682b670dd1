//! Session repository trait.
//!
//! Defines the interface for session persistence. The registry serializes its
//! full collection on every mutation; implementations store that collection
//! last-write-wins under a single slot, so concurrent writers are an explicit
//! non-goal.

use super::model::ChatSession;
use crate::error::Result;

/// An abstract repository for the chat session collection.
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads the stored collection; an absent slot yields an empty list.
    async fn load_all(&self) -> Result<Vec<ChatSession>>;

    /// Replaces the stored collection with `sessions`.
    async fn save_all(&self, sessions: &[ChatSession]) -> Result<()>;
}
