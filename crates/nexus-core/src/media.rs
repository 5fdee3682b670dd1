//! Inline media payloads and gallery entries.

use serde::{Deserialize, Serialize};

/// An inline binary image: MIME type plus base64 payload.
///
/// This is both the domain handle for produced/attached images and the wire
/// shape the generative service consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Renders the image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || data.is_empty() {
            return None;
        }
        Some(Self::new(mime_type, data))
    }
}

/// One generated video in the bounded gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGalleryEntry {
    /// Millisecond timestamp id; also the recency sort key.
    pub id: u64,
    pub prompt: String,
    /// Downloadable URI of the rendered video.
    pub url: String,
    /// Wire aspect-ratio string, e.g. "16:9".
    pub aspect_ratio: String,
    /// Style preset prefix applied to the prompt, empty when none.
    pub style: String,
}

/// Most recent videos kept in the gallery.
pub const VIDEO_GALLERY_LIMIT: usize = 10;
