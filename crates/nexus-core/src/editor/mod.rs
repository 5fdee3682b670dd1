//! Image editor domain module.

mod model;

pub use model::{Adjustments, EDIT_GALLERY_LIMIT, EditGalleryEntry, EditState};
