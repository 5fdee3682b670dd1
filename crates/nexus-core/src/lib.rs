//! Core domain layer for the Nexus client.
//!
//! Holds the domain models (chat sessions, messages, personas, image-edit
//! snapshots, media), the repository and capability traits the services are
//! built against, the shared error type, and the generic undo/redo history
//! utility. Contains no I/O of its own.

pub mod capability;
pub mod chat;
pub mod clock;
pub mod dto;
pub mod editor;
pub mod error;
pub mod history;
pub mod media;
pub mod persona;

pub use error::{NexusError, Result};
