//! Persistence DTOs.
//!
//! Versioned envelopes for everything written to the key/value store. The
//! envelope carries an explicit schema version so a future layout change can
//! migrate on read; conversions to and from the domain types are manual.

use serde::{Deserialize, Serialize};

use crate::chat::ChatSession;
use crate::editor::{Adjustments, EditGalleryEntry};
use crate::media::{InlineImage, VideoGalleryEntry};
use crate::persona::Persona;

/// Store key for the chat session collection.
pub const CHAT_SESSIONS_KEY: &str = "chat_sessions";
/// Store key for the image-edit gallery.
pub const IMAGE_GALLERY_KEY: &str = "image_edit_gallery";
/// Store key for the video gallery.
pub const VIDEO_GALLERY_KEY: &str = "video_gallery";
/// Store key for the in-progress image-editing auto-save slot.
pub const EDITOR_AUTOSAVE_KEY: &str = "image_editor_autosave";
/// Store key for user-defined personas.
pub const PERSONAS_KEY: &str = "personas";

/// Current schema version written by every envelope.
pub const SCHEMA_VERSION: &str = "1";

/// V1 envelope for the full chat session collection.
///
/// The registry serializes the whole collection on every mutation; writers
/// are last-write-wins on this envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBookV1 {
    pub schema_version: String,
    pub sessions: Vec<ChatSession>,
}

impl From<Vec<ChatSession>> for SessionBookV1 {
    fn from(sessions: Vec<ChatSession>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            sessions,
        }
    }
}

impl From<SessionBookV1> for Vec<ChatSession> {
    fn from(book: SessionBookV1) -> Self {
        book.sessions
    }
}

/// V1 envelope for the image-edit gallery (most recent first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditGalleryV1 {
    pub schema_version: String,
    pub entries: Vec<EditGalleryEntry>,
}

impl From<Vec<EditGalleryEntry>> for EditGalleryV1 {
    fn from(entries: Vec<EditGalleryEntry>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            entries,
        }
    }
}

/// V1 envelope for the video gallery (most recent first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoGalleryV1 {
    pub schema_version: String,
    pub entries: Vec<VideoGalleryEntry>,
}

impl From<Vec<VideoGalleryEntry>> for VideoGalleryV1 {
    fn from(entries: Vec<VideoGalleryEntry>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            entries,
        }
    }
}

/// V1 snapshot of the in-progress image-editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveSlotV1 {
    pub schema_version: String,
    pub original: InlineImage,
    pub edited: Option<InlineImage>,
    pub prompt: String,
    pub adjustments: Adjustments,
}

/// V1 envelope for user-defined personas (presets are never stored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSetV1 {
    pub schema_version: String,
    pub personas: Vec<Persona>,
}

impl From<Vec<Persona>> for PersonaSetV1 {
    fn from(personas: Vec<Persona>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            personas,
        }
    }
}

/// Checks an envelope's schema version before conversion.
pub fn check_schema_version(found: &str) -> crate::error::Result<()> {
    if found == SCHEMA_VERSION {
        Ok(())
    } else {
        Err(crate::error::NexusError::Serialization {
            format: "JSON".to_string(),
            message: format!("unsupported schema version '{}'", found),
        })
    }
}
