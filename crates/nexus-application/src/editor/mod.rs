//! Image editor module: edit history, debounced capture, auto-save, gallery.

mod service;
mod shortcuts;

pub use service::{AUTO_SAVE_INTERVAL, DEBOUNCE_QUIET, ImageEditorService};
pub use shortcuts::{HistoryAction, KeyCombo, history_action};
