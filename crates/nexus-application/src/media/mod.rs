//! Media module: image generation and long-running video renders.

mod service;

pub use service::{MediaService, VIDEO_POLL_INTERVAL};
