//! Application services for the Nexus client.
//!
//! Orchestrates the domain layer against the generative service and durable
//! storage: chat sessions with streaming reply assembly, the image editor's
//! undo/redo history with debounced capture and auto-save, media generation
//! with bounded galleries, and story streaming.

pub mod chat;
pub mod editor;
pub mod media;
pub mod story;

pub use chat::ChatService;
pub use editor::{HistoryAction, ImageEditorService, KeyCombo};
pub use media::MediaService;
pub use story::StoryService;
