//! JSON file-backed key/value store.
//!
//! Each key is one JSON document in a base directory. Writes are atomic:
//! content goes to a temporary file, is fsynced, and is renamed over the
//! target, so a crash mid-write never leaves a torn document behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use nexus_core::capability::KeyValueStore;
use nexus_core::error::{NexusError, Result};

/// A `KeyValueStore` storing one file per key under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `base_dir`, creating the directory if
    /// needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| NexusError::persistence(format!("failed to create store directory: {e}")))?;
        Ok(Self { base_dir })
    }

    /// Creates a store at the default platform location.
    pub fn default_location() -> Result<Self> {
        Self::new(crate::paths::NexusPaths::store_dir()?)
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(NexusError::persistence(format!(
                "failed to read {}: {}",
                path.display(),
                err
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.file_path(key);
        let tmp_path = self.base_dir.join(format!("{key}.json.tmp"));

        let value = value.to_string();
        let tmp = tmp_path.clone();
        let target = path.clone();
        // Temp file + fsync + rename keeps the update all-or-nothing.
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, &target)?;
            Ok(())
        })
        .await
        .map_err(|err| NexusError::persistence(format!("store write task failed: {err}")))?
        .map_err(|err| {
            NexusError::persistence(format!("failed to write {}: {}", path.display(), err))
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.file_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(NexusError::persistence(format!(
                "failed to remove {}: {}",
                path.display(),
                err
            ))),
        }
    }
}
