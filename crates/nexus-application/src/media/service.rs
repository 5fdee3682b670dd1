//! Media generation service.
//!
//! Image generation is a single request/response exchange. Video generation
//! is a long-running operation polled on a fixed backoff with a progress
//! callback invoked once per poll; finished renders land in a bounded
//! gallery.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use nexus_core::capability::KeyValueStore;
use nexus_core::clock;
use nexus_core::dto::{VIDEO_GALLERY_KEY, VideoGalleryV1, check_schema_version};
use nexus_core::error::{NexusError, Result};
use nexus_core::media::{InlineImage, VIDEO_GALLERY_LIMIT, VideoGalleryEntry};
use nexus_interaction::{
    GenerativeClient, ImageAspectRatio, VideoAspectRatio, VideoRequest, VideoState,
};

/// Fixed backoff between polls of a long-running video operation.
pub const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Generates images and videos and keeps the bounded video gallery.
#[derive(Clone)]
pub struct MediaService {
    client: Arc<dyn GenerativeClient>,
    store: Arc<dyn KeyValueStore>,
    videos: Arc<RwLock<Vec<VideoGalleryEntry>>>,
}

impl MediaService {
    pub fn new(client: Arc<dyn GenerativeClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            store,
            videos: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Loads the stored video gallery into memory.
    pub async fn load_gallery(&self) -> Result<()> {
        let Some(raw) = self.store.get(VIDEO_GALLERY_KEY).await? else {
            return Ok(());
        };
        let decoded: VideoGalleryV1 = serde_json::from_str(&raw)?;
        check_schema_version(&decoded.schema_version)?;
        *self.videos.write().await = decoded.entries;
        Ok(())
    }

    /// Generates an image from a text prompt.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: ImageAspectRatio,
    ) -> Result<InlineImage> {
        if prompt.trim().is_empty() {
            return Err(NexusError::validation("enter a prompt for your image"));
        }
        self.client
            .generate_image(prompt, aspect_ratio)
            .await
            .map_err(|err| NexusError::transport(err.to_string()))
    }

    /// Renders a video, polling the long-running operation until terminal.
    ///
    /// `progress` runs once per poll. The optional style preset is prefixed
    /// onto the prompt before dispatch and recorded with the gallery entry.
    pub async fn generate_video<F: Fn()>(
        &self,
        prompt: &str,
        style: &str,
        aspect_ratio: VideoAspectRatio,
        image: Option<InlineImage>,
        progress: F,
    ) -> Result<VideoGalleryEntry> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(NexusError::validation("enter a prompt for your video"));
        }
        let final_prompt = if style.is_empty() {
            prompt.to_string()
        } else {
            format!("{style} {prompt}")
        };

        let mut operation = self
            .client
            .start_video(VideoRequest {
                prompt: final_prompt,
                aspect_ratio,
                image,
            })
            .await
            .map_err(|err| NexusError::transport(err.to_string()))?;

        let uri = loop {
            if let VideoState::Done { uri } = operation.state {
                break uri;
            }
            progress();
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;
            operation = self
                .client
                .poll_video(&operation)
                .await
                .map_err(|err| NexusError::transport(err.to_string()))?;
        };

        let entry = VideoGalleryEntry {
            id: clock::monotonic_millis(),
            prompt: prompt.to_string(),
            url: uri,
            aspect_ratio: aspect_ratio.as_str().to_string(),
            style: style.to_string(),
        };
        {
            let mut videos = self.videos.write().await;
            videos.insert(0, entry.clone());
            videos.truncate(VIDEO_GALLERY_LIMIT);
        }
        self.persist_gallery().await;
        Ok(entry)
    }

    pub async fn videos(&self) -> Vec<VideoGalleryEntry> {
        self.videos.read().await.clone()
    }

    pub async fn clear_videos(&self) {
        self.videos.write().await.clear();
        if let Err(err) = self.store.remove(VIDEO_GALLERY_KEY).await {
            tracing::warn!("failed to clear video gallery: {}", err);
        }
    }

    async fn persist_gallery(&self) {
        let entries = self.videos.read().await.clone();
        let envelope = VideoGalleryV1::from(entries);
        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if let Err(err) = self.store.set(VIDEO_GALLERY_KEY, &raw).await {
                    tracing::warn!("failed to persist video gallery: {}", err);
                }
            }
            Err(err) => tracing::warn!("failed to encode video gallery: {}", err),
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
