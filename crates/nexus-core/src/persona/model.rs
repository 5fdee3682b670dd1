//! Persona domain model.
//!
//! Personas are named system-prompt profiles selectable per session. The
//! catalog holds immutable built-in entries plus user-defined ones.

use serde::{Deserialize, Serialize};

/// Represents the source of a persona (built-in or user-created).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonaSource {
    /// Built-in default personas shipped with the application.
    System,
    /// User-created custom personas.
    User,
}

impl Default for PersonaSource {
    fn default() -> Self {
        PersonaSource::User
    }
}

/// A named system-prompt profile.
///
/// Sessions reference personas by id only; resolution happens on use so that
/// a session whose persona was deleted degrades to the default preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier (preset slug or UUID for user personas).
    pub id: String,
    /// Display name.
    pub name: String,
    /// System instruction sent with every request.
    pub instruction: String,
    /// Model-authored message seeding every new session.
    pub welcome_message: String,
    /// Source of the persona (System or User).
    #[serde(default)]
    pub source: PersonaSource,
}

impl Persona {
    /// Creates a user-defined persona with a fresh UUID.
    pub fn new_user(
        name: impl Into<String>,
        instruction: impl Into<String>,
        welcome_message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            instruction: instruction.into(),
            welcome_message: welcome_message.into(),
            source: PersonaSource::User,
        }
    }
}
