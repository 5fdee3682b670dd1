//! Streaming response assembler.
//!
//! Consumes the fragment stream of an in-flight model reply and applies each
//! fragment, in arrival order, to the bound session's final message. The
//! stream belongs to exactly one session, fixed at dispatch time; switching
//! the displayed session mid-stream never redirects fragments.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use nexus_core::chat::{ChatSession, Message, MessageRole, SessionId};
use nexus_core::error::{NexusError, Result};
use nexus_interaction::FragmentStream;

/// Applies an ordered fragment stream to a session's last message.
#[derive(Clone)]
pub(crate) struct ResponseAssembler {
    sessions: Arc<RwLock<HashMap<SessionId, ChatSession>>>,
}

impl ResponseAssembler {
    pub(crate) fn new(sessions: Arc<RwLock<HashMap<SessionId, ChatSession>>>) -> Self {
        Self { sessions }
    }

    /// Drains `fragments` into the session bound at dispatch.
    ///
    /// An empty model message is appended before the first fragment so the
    /// reply is visible from fragment zero, then each fragment extends that
    /// message in place. On mid-stream failure a model-authored apology is
    /// appended after the partial text; nothing is rolled back.
    pub(crate) async fn assemble(
        &self,
        session_id: SessionId,
        mut fragments: FragmentStream,
    ) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(&session_id) else {
                return Err(NexusError::not_found("Session", session_id.to_string()));
            };
            session.push_message(Message::model_empty());
        }

        while let Some(item) = fragments.recv().await {
            match item {
                Ok(fragment) => {
                    let mut sessions = self.sessions.write().await;
                    let Some(session) = sessions.get_mut(&session_id) else {
                        // Session deleted mid-stream: the remaining fragments
                        // have nowhere to land and are drained silently.
                        tracing::warn!(
                            session_id = %session_id,
                            "dropping stream fragments for deleted session"
                        );
                        return Ok(());
                    };
                    if let Some(last) = session.last_message_mut() {
                        if last.role == MessageRole::Model {
                            last.append_text(&fragment);
                        }
                    }
                }
                Err(err) => {
                    let mut sessions = self.sessions.write().await;
                    if let Some(session) = sessions.get_mut(&session_id) {
                        session.push_message(Message::model_text(format!(
                            "Sorry, I encountered an error: {err}"
                        )));
                    }
                    return Err(NexusError::transport(err.to_string()));
                }
            }
        }

        if let Some(session) = self.sessions.write().await.get_mut(&session_id) {
            session.touch();
        }
        Ok(())
    }
}
