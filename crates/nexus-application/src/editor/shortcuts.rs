//! Global undo/redo keyboard shortcuts.
//!
//! Modifier+Z undoes, modifier+shift+Z and modifier+Y redo. The modifier is
//! whichever primary key the platform uses (ctrl or cmd); the caller has
//! already collapsed that distinction.

/// A key press with its modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: char,
    /// Primary modifier (ctrl/cmd) held.
    pub modifier: bool,
    pub shift: bool,
}

impl KeyCombo {
    pub fn new(key: char, modifier: bool, shift: bool) -> Self {
        Self {
            key,
            modifier,
            shift,
        }
    }
}

/// A history navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// Maps a key press to a history action, if it is one of the global
/// shortcuts.
pub fn history_action(combo: KeyCombo) -> Option<HistoryAction> {
    if !combo.modifier {
        return None;
    }
    match combo.key.to_ascii_lowercase() {
        'z' if combo.shift => Some(HistoryAction::Redo),
        'z' => Some(HistoryAction::Undo),
        'y' => Some(HistoryAction::Redo),
        _ => None,
    }
}
