//! Generative service client abstraction.
//!
//! The external collaborator is consumed through the `GenerativeClient`
//! trait: request/response operations for media, and lazy in-order fragment
//! streams for chat and stories. Streams are single-producer single-consumer
//! ordered closeable queues; a fragment is never dropped or reordered.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

use nexus_core::chat::MessagePart;
use nexus_core::media::InlineImage;
use std::sync::Arc;

/// Errors produced by the generative service client.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Non-success HTTP response from the service.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        retryable: bool,
    },

    /// Failure while a fragment stream was in flight.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Malformed or unexpected response payload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Missing or invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Ordered, finite, non-restartable sequence of response fragments.
///
/// The producer closes the channel on completion; a mid-stream failure is
/// delivered in-band as the final item.
pub type FragmentStream = mpsc::Receiver<ClientResult<String>>;

/// Buffer size for fragment channels.
pub const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

/// Role of one accumulated chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

/// One completed turn retained by a chat context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub parts: Vec<MessagePart>,
}

/// Handle to one chat exchange.
///
/// The REST service is stateless, so the handle retains the accumulated turn
/// history and replays it with every request. A context belongs to exactly
/// one session, fixed when the session dispatches its first request.
#[derive(Debug)]
pub struct ChatContext {
    system_instruction: String,
    history: Arc<Mutex<Vec<ChatTurn>>>,
}

impl ChatContext {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Snapshot of the accumulated turns.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().await.clone()
    }

    /// Appends a completed turn.
    pub async fn push_turn(&self, role: TurnRole, parts: Vec<MessagePart>) {
        self.history.lock().await.push(ChatTurn { role, parts });
    }

    /// Shared handle to the turn log, for producers that record the exchange
    /// once the stream finishes.
    pub(crate) fn history_handle(&self) -> Arc<Mutex<Vec<ChatTurn>>> {
        self.history.clone()
    }
}

/// Aspect ratios accepted by image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageAspectRatio {
    #[default]
    Square,
    Widescreen,
    Vertical,
    Landscape,
    Portrait,
}

impl ImageAspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
            Self::Vertical => "9:16",
            Self::Landscape => "4:3",
            Self::Portrait => "3:4",
        }
    }
}

/// Aspect ratios accepted by video generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoAspectRatio {
    #[default]
    Widescreen,
    Vertical,
    Square,
}

impl VideoAspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Widescreen => "16:9",
            Self::Vertical => "9:16",
            Self::Square => "1:1",
        }
    }
}

/// Result of an image edit: the produced image and an optional caption the
/// model returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub image: InlineImage,
    pub caption: Option<String>,
}

/// Inputs for a video generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub aspect_ratio: VideoAspectRatio,
    /// Optional source image to influence the render.
    pub image: Option<InlineImage>,
}

/// State of a long-running video operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoState {
    Pending,
    Done { uri: String },
}

/// Handle to a long-running video operation, polled until terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOperation {
    /// Server-side operation name.
    pub name: String,
    pub state: VideoState,
}

impl VideoOperation {
    pub fn is_done(&self) -> bool {
        matches!(self.state, VideoState::Done { .. })
    }
}

/// Creative constraints for story generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryOptions {
    pub genre: String,
    pub audience: String,
    pub tone: String,
    pub length: String,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            genre: "Fantasy".to_string(),
            audience: "Teenagers".to_string(),
            tone: "Adventurous".to_string(),
            length: "Medium".to_string(),
        }
    }
}

impl StoryOptions {
    /// Composes the storyteller system instruction from the options.
    pub fn system_instruction(&self) -> String {
        format!(
            "You are a creative storyteller. Write a {} story for {}. The genre is {} and the tone should be {}.",
            self.length, self.audience, self.genre, self.tone
        )
    }
}

/// The external generative-AI collaborator.
///
/// Implementations convert their transport failures into `ClientError`; the
/// application layer converts those into user-facing errors before anything
/// reaches presentation code.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Opens a chat exchange with the given system instruction.
    async fn start_chat(&self, system_instruction: &str) -> ClientResult<ChatContext>;

    /// Sends one user turn and returns the fragment stream of the reply.
    ///
    /// The stream may fail mid-sequence; fragments already delivered remain
    /// valid.
    async fn send_streamed(
        &self,
        context: &ChatContext,
        parts: Vec<MessagePart>,
    ) -> ClientResult<FragmentStream>;

    /// Generates an image from a text prompt.
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: ImageAspectRatio,
    ) -> ClientResult<InlineImage>;

    /// Edits an existing image according to a text prompt.
    async fn edit_image(&self, prompt: &str, base: &InlineImage) -> ClientResult<EditOutcome>;

    /// Starts a long-running video render.
    async fn start_video(&self, request: VideoRequest) -> ClientResult<VideoOperation>;

    /// Fetches the current state of a video operation.
    async fn poll_video(&self, operation: &VideoOperation) -> ClientResult<VideoOperation>;

    /// Streams a generated story.
    async fn generate_story_stream(
        &self,
        prompt: &str,
        options: &StoryOptions,
    ) -> ClientResult<FragmentStream>;
}
