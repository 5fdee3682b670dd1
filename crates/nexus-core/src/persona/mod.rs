//! Persona domain module.

mod model;
mod preset;
mod repository;

pub use model::{Persona, PersonaSource};
pub use preset::{DEFAULT_PERSONA_ID, default_persona, default_presets};
pub use repository::PersonaRepository;
