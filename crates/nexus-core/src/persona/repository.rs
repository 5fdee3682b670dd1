//! Persona repository trait.
//!
//! Defines the interface for persona persistence operations, decoupling the
//! catalog from the specific storage mechanism.

use super::model::Persona;
use crate::error::Result;

/// An abstract repository for managing persona persistence.
///
/// Implementations must always include the built-in presets in `get_all` and
/// persist only user-created entries.
#[async_trait::async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Retrieves the full catalog: presets plus stored user personas.
    async fn get_all(&self) -> Result<Vec<Persona>>;

    /// Saves user-created personas, replacing the stored set.
    async fn save_all(&self, personas: &[Persona]) -> Result<()>;
}
