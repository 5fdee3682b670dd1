//! Unified path management for Nexus state on disk.
//!
//! Configuration and durable collections live under the platform config
//! directory so every store agrees on one location.

use std::path::PathBuf;

use nexus_core::error::{NexusError, Result};

/// Unified path management for the Nexus client.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/nexus/             # Config directory
/// ├── secret.json              # API keys
/// └── store/                   # Key/value collections (JsonFileStore)
///     ├── chat_sessions.json
///     ├── image_edit_gallery.json
///     ├── video_gallery.json
///     ├── image_editor_autosave.json
///     └── personas.json
/// ```
pub struct NexusPaths;

impl NexusPaths {
    /// Returns the Nexus configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| NexusError::persistence("cannot find home directory"))?;
        Ok(home.join(".config").join("nexus"))
    }

    /// Returns the directory backing the durable key/value store.
    pub fn store_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("store"))
    }

    /// Returns the path of the secrets file.
    pub fn secret_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_dir_is_under_config_dir() {
        if let (Ok(config), Ok(store)) = (NexusPaths::config_dir(), NexusPaths::store_dir()) {
            assert!(store.starts_with(&config));
        }
    }
}
