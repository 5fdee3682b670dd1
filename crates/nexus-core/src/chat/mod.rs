//! Chat domain module.
//!
//! Session, message, and model-profile types for the conversation core.

mod id;
mod message;
mod model;
mod model_profile;
mod repository;

pub use id::SessionId;
pub use message::{Message, MessagePart, MessageRole};
pub use model::ChatSession;
pub use model_profile::{DEFAULT_MODEL_ID, ModelProfile};
pub use repository::SessionRepository;
