//! Generative-AI service layer for the Nexus client.
//!
//! Defines the `GenerativeClient` trait the application services are written
//! against and provides the Gemini REST implementation.

pub mod client;
pub mod config;
pub mod gemini;

pub use client::{
    ChatContext, ChatTurn, ClientError, ClientResult, EditOutcome, FRAGMENT_CHANNEL_CAPACITY,
    FragmentStream, GenerativeClient, ImageAspectRatio, StoryOptions, TurnRole, VideoAspectRatio,
    VideoOperation, VideoRequest, VideoState,
};
pub use gemini::GeminiClient;
