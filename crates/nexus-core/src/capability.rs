//! Capability traits for environment-provided facilities.
//!
//! Durable storage and speech are environment capabilities (browser local
//! storage, speech synthesis/recognition). They are abstracted behind narrow
//! traits injected into the services so the core runs and tests without a
//! browser runtime. Speech implementations may answer `Unsupported`.

use crate::error::Result;

/// Durable key/value storage for serialized collections.
///
/// Writers are last-write-wins on whole values; there is no per-entry merge.
/// Failures map to `NexusError::Persistence` and callers treat writes as
/// fire-and-forget: a failed write is logged, never fatal.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Text-to-speech playback.
pub trait TextToSpeech: Send + Sync {
    /// Begins reading `text` aloud.
    fn speak(&self, text: &str) -> Result<()>;

    /// Stops any playback in progress.
    fn cancel(&self);
}

/// Speech-to-text capture.
pub trait SpeechRecognizer: Send + Sync {
    /// Starts listening; recognized text is delivered by the implementation.
    fn start(&self) -> Result<()>;

    /// Stops listening.
    fn stop(&self);
}
