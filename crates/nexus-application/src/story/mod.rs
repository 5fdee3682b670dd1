//! Story module: streamed story generation.

mod service;

pub use service::StoryService;
