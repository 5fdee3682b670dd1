//! Chat session service.
//!
//! Owns the in-memory session registry and its active-session pointer,
//! resolves personas and model profiles, dispatches user turns to the
//! generative service, and hands the reply stream to the response assembler.
//! Every registry mutation triggers a full serialization of the collection;
//! a failed write is logged, never fatal, and in-memory state is not rolled
//! back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use nexus_core::capability::TextToSpeech;
use nexus_core::chat::{
    ChatSession, DEFAULT_MODEL_ID, Message, MessagePart, ModelProfile, SessionId,
    SessionRepository,
};
use nexus_core::error::{NexusError, Result};
use nexus_core::persona::{self, Persona, PersonaRepository};
use nexus_interaction::{ChatContext, GenerativeClient};

use super::assembler::ResponseAssembler;

/// Session name used when the first send carries no text.
const ATTACHMENT_ONLY_NAME: &str = "Image Analysis";
/// New sessions are named from a prefix of the first prompt.
const SESSION_NAME_PREFIX_LEN: usize = 30;

/// The currently selected persona and model profile, applied to the next
/// session that gets created.
#[derive(Debug, Clone)]
struct Selection {
    persona_id: String,
    model_id: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            persona_id: persona::DEFAULT_PERSONA_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

/// Manages chat sessions and their lifecycle.
///
/// `ChatService` is responsible for:
/// - Creating, selecting, renaming and deleting sessions
/// - Appending messages and streaming replies into the bound session
/// - Persisting the full collection on every mutation
#[derive(Clone)]
pub struct ChatService {
    /// In-memory session registry
    sessions: Arc<RwLock<HashMap<SessionId, ChatSession>>>,
    /// Active session pointer; `None` means the next send creates a session
    active: Arc<RwLock<Option<SessionId>>>,
    /// Per-session chat contexts, fixed at first dispatch
    contexts: Arc<Mutex<HashMap<SessionId, Arc<ChatContext>>>>,
    /// Sessions with a stream currently in flight
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
    /// Persona and model applied to the next created session
    selection: Arc<RwLock<Selection>>,
    personas: Arc<dyn PersonaRepository>,
    repository: Arc<dyn SessionRepository>,
    client: Arc<dyn GenerativeClient>,
    speech: Option<Arc<dyn TextToSpeech>>,
    assembler: ResponseAssembler,
}

impl ChatService {
    /// Creates a new `ChatService` with its collaborators.
    pub fn new(
        personas: Arc<dyn PersonaRepository>,
        repository: Arc<dyn SessionRepository>,
        client: Arc<dyn GenerativeClient>,
    ) -> Self {
        let sessions: Arc<RwLock<HashMap<SessionId, ChatSession>>> =
            Arc::new(RwLock::new(HashMap::new()));
        Self {
            assembler: ResponseAssembler::new(sessions.clone()),
            sessions,
            active: Arc::new(RwLock::new(None)),
            contexts: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            selection: Arc::new(RwLock::new(Selection::default())),
            personas,
            repository,
            client,
            speech: None,
        }
    }

    /// Attaches a text-to-speech capability.
    pub fn with_text_to_speech(mut self, speech: Arc<dyn TextToSpeech>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Loads the stored session collection into the registry.
    pub async fn load(&self) -> Result<()> {
        let stored = self.repository.load_all().await?;
        let mut sessions = self.sessions.write().await;
        sessions.clear();
        for session in stored {
            sessions.insert(session.id, session);
        }
        Ok(())
    }

    /// Creates a new session seeded with the persona's welcome message and
    /// registers it as active.
    ///
    /// The session is named from a prefix of `initial_input`, or a fixed
    /// attachment label when the input is empty.
    pub async fn create_session(
        &self,
        persona_id: &str,
        model_id: &str,
        initial_input: &str,
    ) -> Result<SessionId> {
        let persona = self.resolve_persona(persona_id).await;
        let profile = ModelProfile::find(model_id);
        let name = derive_session_name(initial_input);

        let session = ChatSession::new(name, persona.id.clone(), profile.id, persona.welcome_message);
        let id = session.id;

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id, session);
        }
        *self.active.write().await = Some(id);
        self.persist().await;
        Ok(id)
    }

    /// Sets the active session and restores its persona/model selection.
    pub async fn select_session(&self, session_id: SessionId) -> Result<ChatSession> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&session_id)
                .cloned()
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?
        };

        *self.active.write().await = Some(session_id);
        *self.selection.write().await = Selection {
            persona_id: session.persona_id.clone(),
            model_id: session.model_id.clone(),
        };
        Ok(session)
    }

    /// Appends a message to a session.
    ///
    /// Safe to call while the assembler is extending the same session's last
    /// message: all registry mutations serialize on one lock, so entries are
    /// never duplicated or reordered.
    pub async fn append_message(&self, session_id: SessionId, message: Message) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?;
            session.push_message(message);
        }
        self.persist().await;
        Ok(())
    }

    /// Renames a session. Empty or whitespace-only names are rejected.
    pub async fn rename_session(&self, session_id: SessionId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NexusError::validation("session name must not be empty"));
        }
        {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?;
            session.name = name.to_string();
            session.touch();
        }
        self.persist().await;
        Ok(())
    }

    /// Deletes a session.
    ///
    /// Deleting the active session leaves the registry with no active
    /// session; the next send creates a brand-new one. A deleted id never
    /// resurfaces.
    pub async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            if sessions.remove(&session_id).is_none() {
                return Err(NexusError::not_found("Session", session_id.to_string()));
            }
        }
        {
            let mut active = self.active.write().await;
            if *active == Some(session_id) {
                *active = None;
            }
        }
        self.contexts.lock().await.remove(&session_id);
        self.persist().await;
        Ok(())
    }

    /// Lists sessions ordered by creation recency, newest first.
    pub async fn list_sessions(&self) -> Vec<ChatSession> {
        let sessions = self.sessions.read().await;
        let mut list: Vec<ChatSession> = sessions.values().cloned().collect();
        list.sort_by(|a, b| b.id.cmp(&a.id));
        list
    }

    /// Returns the active session id, if any.
    pub async fn active_session_id(&self) -> Option<SessionId> {
        *self.active.read().await
    }

    /// Returns a snapshot of the active session, if any.
    pub async fn active_session(&self) -> Option<ChatSession> {
        let active = *self.active.read().await;
        let sessions = self.sessions.read().await;
        active.and_then(|id| sessions.get(&id).cloned())
    }

    /// Clears the active pointer so the next send starts a fresh session.
    pub async fn new_chat(&self) {
        *self.active.write().await = None;
    }

    /// Selects the persona applied to the next created session.
    ///
    /// Changing persona starts a new chat, as does changing model.
    pub async fn set_persona(&self, persona_id: &str) {
        self.selection.write().await.persona_id = persona_id.to_string();
        self.new_chat().await;
    }

    /// Selects the model profile applied to the next created session.
    pub async fn set_model(&self, model_id: &str) {
        self.selection.write().await.model_id = model_id.to_string();
        self.new_chat().await;
    }

    /// Sends a user turn and streams the reply into the bound session.
    ///
    /// Creates a session on demand when none is active. The reply stream is
    /// bound to that session for its whole life; switching the active session
    /// while it runs does not redirect fragments. A second send to a session
    /// with a stream in flight is rejected.
    pub async fn send_message(
        &self,
        text: &str,
        attachments: Vec<MessagePart>,
    ) -> Result<SessionId> {
        let trimmed = text.trim();
        if trimmed.is_empty() && attachments.is_empty() {
            return Err(NexusError::validation(
                "enter a message or attach an image",
            ));
        }

        // Bind the target session now; everything below writes to it even if
        // the user switches away mid-stream.
        let session_id = {
            let active = *self.active.read().await;
            let exists = match active {
                Some(id) => self.sessions.read().await.contains_key(&id),
                None => false,
            };
            match active {
                Some(id) if exists => id,
                _ => {
                    let selection = self.selection.read().await.clone();
                    self.create_session(&selection.persona_id, &selection.model_id, trimmed)
                        .await?
                }
            }
        };

        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(session_id) {
                return Err(NexusError::validation(
                    "a response is already streaming for this session",
                ));
            }
        }

        let result = self.dispatch(session_id, trimmed, attachments).await;
        self.in_flight.lock().await.remove(&session_id);
        result?;
        Ok(session_id)
    }

    async fn dispatch(
        &self,
        session_id: SessionId,
        text: &str,
        attachments: Vec<MessagePart>,
    ) -> Result<()> {
        let mut parts = attachments;
        if !text.is_empty() {
            parts.push(MessagePart::text(text));
        }

        {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?;
            session.push_message(Message::user(parts.clone()));
        }
        self.persist().await;

        let context = match self.context_for(session_id).await {
            Ok(context) => context,
            Err(err) => {
                self.append_apology(session_id, &err).await;
                return Err(err);
            }
        };

        let stream = match self.client.send_streamed(&context, parts).await {
            Ok(stream) => stream,
            Err(err) => {
                let err = NexusError::transport(err.to_string());
                self.append_apology(session_id, &err).await;
                return Err(err);
            }
        };

        let outcome = self.assembler.assemble(session_id, stream).await;
        self.persist().await;
        outcome
    }

    /// Reads a message's text aloud through the configured speech capability.
    pub async fn read_aloud(&self, session_id: SessionId, message_index: usize) -> Result<()> {
        let speech = self.speech.as_ref().ok_or_else(|| {
            NexusError::unsupported("voice output is not available in this environment")
        })?;

        let text = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(&session_id)
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?;
            session
                .messages
                .get(message_index)
                .map(Message::text)
                .ok_or_else(|| {
                    NexusError::not_found("Message", message_index.to_string())
                })?
        };
        speech.speak(&text)
    }

    /// Resolves a persona by id, tolerating deletion by falling back to the
    /// default preset.
    async fn resolve_persona(&self, persona_id: &str) -> Persona {
        match self.personas.get_all().await {
            Ok(catalog) => catalog
                .into_iter()
                .find(|p| p.id == persona_id)
                .unwrap_or_else(persona::default_persona),
            Err(err) => {
                tracing::warn!("failed to load personas, using default: {}", err);
                persona::default_persona()
            }
        }
    }

    /// Returns the session's chat context, opening one on first use.
    async fn context_for(&self, session_id: SessionId) -> Result<Arc<ChatContext>> {
        let mut contexts = self.contexts.lock().await;
        if let Some(context) = contexts.get(&session_id) {
            return Ok(context.clone());
        }

        let (persona_id, model_id) = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(&session_id)
                .ok_or_else(|| NexusError::not_found("Session", session_id.to_string()))?;
            (session.persona_id.clone(), session.model_id.clone())
        };
        let persona = self.resolve_persona(&persona_id).await;
        let instruction = ModelProfile::find(&model_id).system_instruction(&persona.instruction);

        let context = self
            .client
            .start_chat(&instruction)
            .await
            .map_err(|err| NexusError::transport(err.to_string()))?;
        let context = Arc::new(context);
        contexts.insert(session_id, context.clone());
        Ok(context)
    }

    async fn append_apology(&self, session_id: SessionId, err: &NexusError) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.push_message(Message::model_text(format!(
                "Sorry, I encountered an error: {err}"
            )));
        }
        drop(sessions);
        self.persist().await;
    }

    /// Serializes the full collection to storage, newest first.
    ///
    /// Failures are logged and swallowed: user-visible chat state is never
    /// rolled back over a storage problem.
    async fn persist(&self) {
        let snapshot = self.list_sessions().await;
        if let Err(err) = self.repository.save_all(&snapshot).await {
            tracing::warn!("failed to persist chat sessions: {}", err);
        }
    }
}

fn derive_session_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ATTACHMENT_ONLY_NAME.to_string();
    }
    trimmed.chars().take(SESSION_NAME_PREFIX_LEN).collect()
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
