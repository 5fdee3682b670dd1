//! Speech capability stubs.
//!
//! Environments without speech synthesis or recognition plug these in: every
//! call answers `Unsupported` so the feature degrades gracefully, and the
//! condition is logged once rather than on every attempt.

use std::sync::atomic::{AtomicBool, Ordering};

use nexus_core::capability::{SpeechRecognizer, TextToSpeech};
use nexus_core::error::{NexusError, Result};

/// A `TextToSpeech`/`SpeechRecognizer` for environments without speech.
#[derive(Debug, Default)]
pub struct UnsupportedSpeech {
    notified: AtomicBool,
}

impl UnsupportedSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    fn unsupported(&self, what: &str) -> NexusError {
        if !self.notified.swap(true, Ordering::Relaxed) {
            tracing::warn!("{} is not available in this environment", what);
        }
        NexusError::unsupported(format!("{what} is not available in this environment"))
    }
}

impl TextToSpeech for UnsupportedSpeech {
    fn speak(&self, _text: &str) -> Result<()> {
        Err(self.unsupported("voice output"))
    }

    fn cancel(&self) {}
}

impl SpeechRecognizer for UnsupportedSpeech {
    fn start(&self) -> Result<()> {
        Err(self.unsupported("voice input"))
    }

    fn stop(&self) {}
}
