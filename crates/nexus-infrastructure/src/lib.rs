//! Infrastructure layer for the Nexus client.
//!
//! Durable storage implementations and environment capability stubs behind
//! the traits `nexus-core` defines.

pub mod json_store;
pub mod memory_store;
pub mod paths;
pub mod persona_repository;
pub mod session_repository;
pub mod speech;

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use paths::NexusPaths;
pub use persona_repository::KvPersonaRepository;
pub use session_repository::KvSessionRepository;
pub use speech::UnsupportedSpeech;
