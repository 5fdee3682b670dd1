//! Key/value-backed SessionRepository implementation.

use std::sync::Arc;

use async_trait::async_trait;

use nexus_core::capability::KeyValueStore;
use nexus_core::chat::{ChatSession, SessionRepository};
use nexus_core::dto::{CHAT_SESSIONS_KEY, SessionBookV1, check_schema_version};
use nexus_core::error::Result;

/// Stores the whole session collection as one versioned JSON document.
///
/// Writers are last-write-wins on the document; concurrent writers (other
/// windows of the same profile) are an explicit non-goal.
pub struct KvSessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvSessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionRepository for KvSessionRepository {
    async fn load_all(&self) -> Result<Vec<ChatSession>> {
        let Some(raw) = self.store.get(CHAT_SESSIONS_KEY).await? else {
            return Ok(Vec::new());
        };
        let book: SessionBookV1 = serde_json::from_str(&raw)?;
        check_schema_version(&book.schema_version)?;
        Ok(book.into())
    }

    async fn save_all(&self, sessions: &[ChatSession]) -> Result<()> {
        let book = SessionBookV1::from(sessions.to_vec());
        let raw = serde_json::to_string(&book)?;
        self.store.set(CHAT_SESSIONS_KEY, &raw).await
    }
}
