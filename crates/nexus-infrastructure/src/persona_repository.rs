//! Key/value-backed PersonaRepository implementation.

use std::sync::Arc;

use async_trait::async_trait;

use nexus_core::capability::KeyValueStore;
use nexus_core::dto::{PERSONAS_KEY, PersonaSetV1, check_schema_version};
use nexus_core::error::Result;
use nexus_core::persona::{Persona, PersonaRepository, PersonaSource, default_presets};

/// Merges the built-in presets with user-defined personas from storage.
///
/// Presets are code, not data: `get_all` always includes them and `save_all`
/// persists only the user-created entries.
pub struct KvPersonaRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvPersonaRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PersonaRepository for KvPersonaRepository {
    async fn get_all(&self) -> Result<Vec<Persona>> {
        let mut catalog = default_presets();
        if let Some(raw) = self.store.get(PERSONAS_KEY).await? {
            let stored: PersonaSetV1 = serde_json::from_str(&raw)?;
            check_schema_version(&stored.schema_version)?;
            catalog.extend(
                stored
                    .personas
                    .into_iter()
                    .filter(|p| p.source == PersonaSource::User),
            );
        }
        Ok(catalog)
    }

    async fn save_all(&self, personas: &[Persona]) -> Result<()> {
        let user_personas: Vec<Persona> = personas
            .iter()
            .filter(|p| p.source == PersonaSource::User)
            .cloned()
            .collect();
        let envelope = PersonaSetV1::from(user_personas);
        let raw = serde_json::to_string(&envelope)?;
        self.store.set(PERSONAS_KEY, &raw).await
    }
}
