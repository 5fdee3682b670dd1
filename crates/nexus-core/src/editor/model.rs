//! Image editor domain model.
//!
//! Edit snapshots and their numeric adjustment parameters. Every history
//! entry is a value snapshot; entries are never shared by reference.

use serde::{Deserialize, Serialize};

use crate::media::InlineImage;

/// Numeric adjustment parameters, as percentages.
///
/// Intensity and sepia range over 0..=100, brightness/contrast/saturation
/// over 0..=200. Values outside a range are clamped, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustments {
    /// Opacity of the AI edit overlay.
    pub intensity: u16,
    pub brightness: u16,
    pub contrast: u16,
    pub saturation: u16,
    pub sepia: u16,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            intensity: 100,
            brightness: 100,
            contrast: 100,
            saturation: 100,
            sepia: 0,
        }
    }
}

impl Adjustments {
    /// Returns a copy with every parameter clamped into its range.
    pub fn clamped(self) -> Self {
        Self {
            intensity: self.intensity.min(100),
            brightness: self.brightness.min(200),
            contrast: self.contrast.min(200),
            saturation: self.saturation.min(200),
            sepia: self.sepia.min(100),
        }
    }
}

/// One snapshot of the editing session: the produced edit, the prompt that
/// generated it, and the adjustment parameters applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditState {
    /// The AI-produced edit, if one has been generated.
    pub edited_image: Option<InlineImage>,
    /// Prompt the edit was generated from.
    pub prompt: String,
    pub adjustments: Adjustments,
}

impl EditState {
    /// A snapshot of a freshly generated edit with neutral adjustments.
    pub fn generated(edited_image: InlineImage, prompt: impl Into<String>) -> Self {
        Self {
            edited_image: Some(edited_image),
            prompt: prompt.into(),
            adjustments: Adjustments::default(),
        }
    }
}

/// One completed edit in the bounded gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditGalleryEntry {
    /// Millisecond timestamp id; also the recency sort key.
    pub id: u64,
    pub prompt: String,
    pub original: InlineImage,
    pub edited: InlineImage,
}

/// Most recent edits kept in the gallery.
pub const EDIT_GALLERY_LIMIT: usize = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_adjustments_are_neutral() {
        let adjustments = Adjustments::default();
        assert_eq!(adjustments.intensity, 100);
        assert_eq!(adjustments.sepia, 0);
    }

    #[test]
    fn clamped_caps_out_of_range_values() {
        let adjustments = Adjustments {
            intensity: 400,
            brightness: 999,
            contrast: 150,
            saturation: 201,
            sepia: 101,
        }
        .clamped();
        assert_eq!(adjustments.intensity, 100);
        assert_eq!(adjustments.brightness, 200);
        assert_eq!(adjustments.contrast, 150);
        assert_eq!(adjustments.saturation, 200);
        assert_eq!(adjustments.sepia, 100);
    }
}
