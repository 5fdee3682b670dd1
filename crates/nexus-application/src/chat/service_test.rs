use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use nexus_core::chat::{ChatSession, MessagePart, MessageRole, SessionRepository};
use nexus_core::error::Result as CoreResult;
use nexus_core::persona::{self, Persona, PersonaRepository};
use nexus_interaction::{
    ChatContext, ClientError, ClientResult, EditOutcome, FragmentStream, GenerativeClient,
    ImageAspectRatio, StoryOptions, VideoOperation, VideoRequest,
};

use super::ChatService;

struct MockPersonaRepository;

#[async_trait]
impl PersonaRepository for MockPersonaRepository {
    async fn get_all(&self) -> CoreResult<Vec<Persona>> {
        Ok(persona::default_presets())
    }

    async fn save_all(&self, _personas: &[Persona]) -> CoreResult<()> {
        Ok(())
    }
}

struct MockSessionRepository {
    saved: Mutex<Vec<ChatSession>>,
    fail_saves: AtomicBool,
}

impl MockSessionRepository {
    fn new() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_saves: AtomicBool::new(false),
        }
    }

    fn saved(&self) -> Vec<ChatSession> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn load_all(&self) -> CoreResult<Vec<ChatSession>> {
        Ok(self.saved())
    }

    async fn save_all(&self, sessions: &[ChatSession]) -> CoreResult<()> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(nexus_core::NexusError::persistence("disk full"));
        }
        *self.saved.lock().unwrap() = sessions.to_vec();
        Ok(())
    }
}

/// Client that answers each send with a pre-scripted fragment sequence.
struct ScriptedClient {
    scripts: Mutex<VecDeque<Vec<ClientResult<String>>>>,
}

impl ScriptedClient {
    fn new(scripts: Vec<Vec<ClientResult<String>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
        }
    }
}

#[async_trait]
impl GenerativeClient for ScriptedClient {
    async fn start_chat(&self, system_instruction: &str) -> ClientResult<ChatContext> {
        Ok(ChatContext::new(system_instruction))
    }

    async fn send_streamed(
        &self,
        _context: &ChatContext,
        _parts: Vec<MessagePart>,
    ) -> ClientResult<FragmentStream> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::Config("no scripted reply left".to_string()))?;
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for item in script {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _aspect_ratio: ImageAspectRatio,
    ) -> ClientResult<nexus_core::media::InlineImage> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn edit_image(
        &self,
        _prompt: &str,
        _base: &nexus_core::media::InlineImage,
    ) -> ClientResult<EditOutcome> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn start_video(&self, _request: VideoRequest) -> ClientResult<VideoOperation> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn poll_video(&self, _operation: &VideoOperation) -> ClientResult<VideoOperation> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn generate_story_stream(
        &self,
        _prompt: &str,
        _options: &StoryOptions,
    ) -> ClientResult<FragmentStream> {
        Err(ClientError::Config("not scripted".to_string()))
    }
}

/// Client whose single stream is fed manually by the test.
struct HeldClient {
    stream: Mutex<Option<FragmentStream>>,
}

impl HeldClient {
    fn new(stream: FragmentStream) -> Self {
        Self {
            stream: Mutex::new(Some(stream)),
        }
    }
}

#[async_trait]
impl GenerativeClient for HeldClient {
    async fn start_chat(&self, system_instruction: &str) -> ClientResult<ChatContext> {
        Ok(ChatContext::new(system_instruction))
    }

    async fn send_streamed(
        &self,
        _context: &ChatContext,
        _parts: Vec<MessagePart>,
    ) -> ClientResult<FragmentStream> {
        self.stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ClientError::Config("stream already taken".to_string()))
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _aspect_ratio: ImageAspectRatio,
    ) -> ClientResult<nexus_core::media::InlineImage> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn edit_image(
        &self,
        _prompt: &str,
        _base: &nexus_core::media::InlineImage,
    ) -> ClientResult<EditOutcome> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn start_video(&self, _request: VideoRequest) -> ClientResult<VideoOperation> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn poll_video(&self, _operation: &VideoOperation) -> ClientResult<VideoOperation> {
        Err(ClientError::Config("not scripted".to_string()))
    }

    async fn generate_story_stream(
        &self,
        _prompt: &str,
        _options: &StoryOptions,
    ) -> ClientResult<FragmentStream> {
        Err(ClientError::Config("not scripted".to_string()))
    }
}

fn service_with(client: Arc<dyn GenerativeClient>) -> (ChatService, Arc<MockSessionRepository>) {
    let repository = Arc::new(MockSessionRepository::new());
    let service = ChatService::new(Arc::new(MockPersonaRepository), repository.clone(), client);
    (service, repository)
}

/// Lets spawned tasks on the current-thread runtime run until they block.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn send_creates_session_and_assembles_stream() {
    let client = Arc::new(ScriptedClient::new(vec![vec![
        Ok("Hel".to_string()),
        Ok("lo!".to_string()),
    ]]));
    let (service, _repository) = service_with(client);

    let session_id = service.send_message("Hi", Vec::new()).await.unwrap();

    let sessions = service.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];
    assert_eq!(session.id, session_id);
    assert_eq!(session.name, "Hi");

    // welcome + user + streamed model reply
    assert_eq!(session.messages.len(), 3);
    assert_eq!(session.messages[0].role, MessageRole::Model);
    assert_eq!(session.messages[1].text(), "Hi");
    assert_eq!(session.messages[2].role, MessageRole::Model);
    assert_eq!(session.messages[2].text(), "Hello!");
}

#[tokio::test]
async fn empty_send_is_rejected_without_mutation() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let (service, repository) = service_with(client);

    let err = service.send_message("   ", Vec::new()).await.unwrap_err();
    assert!(err.is_validation());
    assert!(service.list_sessions().await.is_empty());
    assert!(repository.saved().is_empty());
}

#[tokio::test]
async fn attachment_only_send_names_session_after_attachment() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("A cat.".to_string())]]));
    let (service, _repository) = service_with(client);

    let attachment = MessagePart::inline_data("image/png", "AAAA");
    service.send_message("", vec![attachment]).await.unwrap();

    let sessions = service.list_sessions().await;
    assert_eq!(sessions[0].name, "Image Analysis");
}

#[tokio::test]
async fn deleting_active_session_never_resurrects_it() {
    let client = Arc::new(ScriptedClient::new(vec![
        vec![Ok("first".to_string())],
        vec![Ok("second".to_string())],
    ]));
    let (service, _repository) = service_with(client);

    let first = service.send_message("one", Vec::new()).await.unwrap();
    service.delete_session(first).await.unwrap();
    assert_eq!(service.active_session_id().await, None);

    let second = service.send_message("two", Vec::new()).await.unwrap();
    assert_ne!(first, second);
    assert!(second > first);

    let ids: Vec<_> = service.list_sessions().await.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second]);
}

#[tokio::test]
async fn sessions_list_newest_first() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let (service, _repository) = service_with(client);

    let a = service.create_session("nexus", "flash", "a").await.unwrap();
    let b = service.create_session("nexus", "flash", "b").await.unwrap();
    let c = service.create_session("nexus", "flash", "c").await.unwrap();

    let ids: Vec<_> = service.list_sessions().await.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![c, b, a]);
}

#[tokio::test]
async fn select_restores_persona_and_model_selection() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("ok".to_string())]]));
    let (service, _repository) = service_with(client);

    service.set_persona("technical").await;
    service.set_model("pro").await;
    let id = service.send_message("review this", Vec::new()).await.unwrap();

    // Selecting another persona resets to a fresh chat...
    service.set_persona("creative").await;
    assert_eq!(service.active_session_id().await, None);

    // ...and re-selecting the session restores its configuration.
    let session = service.select_session(id).await.unwrap();
    assert_eq!(session.persona_id, "technical");
    assert_eq!(session.model_id, "pro");
    assert_eq!(service.active_session_id().await, Some(id));
}

#[tokio::test]
async fn select_missing_session_is_not_found() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("x".to_string())]]));
    let (service, _repository) = service_with(client);

    let id = service.send_message("hello", Vec::new()).await.unwrap();
    service.delete_session(id).await.unwrap();

    let err = service.select_session(id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn rename_rejects_empty_names() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("x".to_string())]]));
    let (service, _repository) = service_with(client);

    let id = service.send_message("hello", Vec::new()).await.unwrap();
    let err = service.rename_session(id, "   ").await.unwrap_err();
    assert!(err.is_validation());

    service.rename_session(id, "Renamed").await.unwrap();
    assert_eq!(service.list_sessions().await[0].name, "Renamed");
}

#[tokio::test]
async fn mutations_persist_full_collection() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("x".to_string())]]));
    let (service, repository) = service_with(client);

    let id = service.send_message("hello", Vec::new()).await.unwrap();
    service.rename_session(id, "Kept").await.unwrap();

    let saved = repository.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "Kept");
    assert_eq!(saved[0].messages.len(), 3);
}

#[tokio::test]
async fn persistence_failure_does_not_roll_back_memory() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("x".to_string())]]));
    let (service, repository) = service_with(client);

    let id = service.send_message("hello", Vec::new()).await.unwrap();
    repository.fail_saves.store(true, Ordering::Relaxed);

    service.rename_session(id, "Still here").await.unwrap();
    assert_eq!(service.list_sessions().await[0].name, "Still here");
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_text_and_apologizes() {
    let client = Arc::new(ScriptedClient::new(vec![vec![
        Ok("partial ".to_string()),
        Err(ClientError::Stream("connection reset".to_string())),
    ]]));
    let (service, _repository) = service_with(client);

    let err = service.send_message("hello", Vec::new()).await.unwrap_err();
    assert!(err.is_transport());

    let session = &service.list_sessions().await[0];
    // welcome + user + partial model text + apology
    assert_eq!(session.messages.len(), 4);
    assert_eq!(session.messages[2].text(), "partial ");
    assert!(session.messages[3].text().starts_with("Sorry, I encountered an error"));
}

#[tokio::test]
async fn stream_stays_bound_to_its_session_after_switching() {
    let (tx, rx) = mpsc::channel(8);
    let client = Arc::new(HeldClient::new(rx));
    let repository = Arc::new(MockSessionRepository::new());
    let service = ChatService::new(
        Arc::new(MockPersonaRepository),
        repository.clone(),
        client.clone(),
    );

    let other = service.create_session("nexus", "flash", "other").await.unwrap();

    service.new_chat().await;
    let sender = {
        let service = service.clone();
        tokio::spawn(async move { service.send_message("stream me", Vec::new()).await })
    };
    settle().await;

    let bound = service
        .list_sessions()
        .await
        .into_iter()
        .find(|s| s.name == "stream me")
        .unwrap()
        .id;

    // User switches away while the stream is still in flight.
    service.select_session(other).await.unwrap();

    tx.send(Ok("went ".to_string())).await.unwrap();
    tx.send(Ok("home".to_string())).await.unwrap();
    drop(tx);

    let streamed_to = sender.await.unwrap().unwrap();
    assert_eq!(streamed_to, bound);

    let sessions = service.list_sessions().await;
    let bound_session = sessions.iter().find(|s| s.id == bound).unwrap();
    let other_session = sessions.iter().find(|s| s.id == other).unwrap();
    assert_eq!(bound_session.messages.last().unwrap().text(), "went home");
    assert_eq!(other_session.messages.len(), 1);
}

#[tokio::test]
async fn concurrent_send_to_streaming_session_is_rejected() {
    let (tx, rx) = mpsc::channel(8);
    let client = Arc::new(HeldClient::new(rx));
    let repository = Arc::new(MockSessionRepository::new());
    let service = ChatService::new(Arc::new(MockPersonaRepository), repository, client);

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.send_message("first", Vec::new()).await })
    };
    settle().await;

    let err = service.send_message("second", Vec::new()).await.unwrap_err();
    assert!(err.is_validation());

    drop(tx);
    first.await.unwrap().unwrap();
}

#[tokio::test]
async fn read_aloud_without_speech_is_unsupported() {
    let client = Arc::new(ScriptedClient::new(vec![vec![Ok("x".to_string())]]));
    let (service, _repository) = service_with(client);

    let id = service.send_message("hello", Vec::new()).await.unwrap();
    let err = service.read_aloud(id, 0).await.unwrap_err();
    assert!(err.is_unsupported());
}

#[tokio::test]
async fn load_restores_stored_sessions() {
    let client: Arc<dyn GenerativeClient> = Arc::new(ScriptedClient::new(vec![]));
    let repository = Arc::new(MockSessionRepository::new());
    *repository.saved.lock().unwrap() = vec![ChatSession::new("Stored", "nexus", "flash", "Hi")];

    let service = ChatService::new(Arc::new(MockPersonaRepository), repository, client);
    service.load().await.unwrap();

    let sessions = service.list_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "Stored");
    assert_eq!(service.active_session_id().await, None);
}
