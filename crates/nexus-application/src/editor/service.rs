//! Image editor service.
//!
//! Owns the editing session: the loaded image, the AI edit on top of it, the
//! adjustment parameters, and the linear undo/redo history of snapshots.
//! Continuous parameter changes are coalesced into a single history entry
//! after a quiet period, the in-progress session is auto-saved on a fixed
//! interval, and completed edits land in a bounded gallery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use nexus_core::capability::KeyValueStore;
use nexus_core::clock;
use nexus_core::dto::{
    AutoSaveSlotV1, EDITOR_AUTOSAVE_KEY, EditGalleryV1, IMAGE_GALLERY_KEY, SCHEMA_VERSION,
    check_schema_version,
};
use nexus_core::editor::{Adjustments, EDIT_GALLERY_LIMIT, EditGalleryEntry, EditState};
use nexus_core::error::{NexusError, Result};
use nexus_core::history::HistoryStack;
use nexus_core::media::InlineImage;
use nexus_interaction::{EditOutcome, GenerativeClient};

use super::shortcuts::{self, HistoryAction, KeyCombo};

/// Quiet period before coalesced parameter changes become one history entry.
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(500);
/// Interval between auto-save writes while an image is loaded.
pub const AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Live editing state, distinct from the history snapshots taken of it.
#[derive(Debug, Clone, Default)]
struct EditorState {
    original: Option<InlineImage>,
    edited: Option<InlineImage>,
    prompt: String,
    adjustments: Adjustments,
    caption: Option<String>,
}

/// Manages one image-editing session and its undo/redo history.
#[derive(Clone)]
pub struct ImageEditorService {
    client: Arc<dyn GenerativeClient>,
    store: Arc<dyn KeyValueStore>,
    state: Arc<RwLock<EditorState>>,
    history: Arc<RwLock<HistoryStack<EditState>>>,
    gallery: Arc<RwLock<Vec<EditGalleryEntry>>>,
    /// Bumped by every parameter change and every history navigation; a
    /// pending debounce capture only commits if its generation is still
    /// current, which both coalesces rapid changes and suppresses captures
    /// around undo/redo.
    debounce_generation: Arc<AtomicU64>,
}

impl ImageEditorService {
    pub fn new(client: Arc<dyn GenerativeClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client,
            store,
            state: Arc::new(RwLock::new(EditorState::default())),
            history: Arc::new(RwLock::new(HistoryStack::new())),
            gallery: Arc::new(RwLock::new(Vec::new())),
            debounce_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Loads the stored gallery into memory.
    pub async fn load_gallery(&self) -> Result<()> {
        let Some(raw) = self.store.get(IMAGE_GALLERY_KEY).await? else {
            return Ok(());
        };
        let decoded: EditGalleryV1 = serde_json::from_str(&raw)?;
        check_schema_version(&decoded.schema_version)?;
        *self.gallery.write().await = decoded.entries;
        Ok(())
    }

    /// Loads a new source image, resetting the editing session.
    ///
    /// Clears the edit result, the history, and the auto-save slot.
    pub async fn load_image(&self, image: InlineImage) {
        self.invalidate_pending_capture();
        {
            let mut history = self.history.write().await;
            history.clear();
        }
        {
            let mut state = self.state.write().await;
            state.original = Some(image);
            state.edited = None;
            state.caption = None;
            state.adjustments = Adjustments::default();
        }
        self.clear_auto_save().await;
    }

    pub async fn set_prompt(&self, prompt: &str) {
        self.state.write().await.prompt = prompt.to_string();
    }

    /// Applies a live parameter change and schedules a debounced capture.
    ///
    /// Rapid successive changes coalesce into one history entry pushed after
    /// the quiet period; a change made obsolete by a newer one, a navigation,
    /// or a generated edit never commits.
    pub async fn set_adjustments(&self, adjustments: Adjustments) {
        let adjustments = adjustments.clamped();
        self.state.write().await.adjustments = adjustments;

        let generation = self.debounce_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let service = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_QUIET).await;
            service.commit_capture(generation).await;
        });
    }

    /// Resets every adjustment to neutral (itself a capturable change).
    pub async fn reset_adjustments(&self) {
        self.set_adjustments(Adjustments::default()).await;
    }

    async fn commit_capture(&self, generation: u64) {
        if self.debounce_generation.load(Ordering::Relaxed) != generation {
            return;
        }
        let mut history = self.history.write().await;
        // Parameter tweaks before the first generated edit are not snapshots.
        let Some(current) = history.current().cloned() else {
            return;
        };
        let state = self.state.read().await.clone();
        if current.adjustments == state.adjustments {
            return;
        }
        history.push(EditState {
            edited_image: state.edited,
            prompt: state.prompt,
            adjustments: state.adjustments,
        });
    }

    /// Generates an AI edit of the loaded image from the current prompt.
    pub async fn generate_edit(&self) -> Result<EditOutcome> {
        let (original, prompt) = {
            let state = self.state.read().await;
            (state.original.clone(), state.prompt.clone())
        };
        if prompt.trim().is_empty() {
            return Err(NexusError::validation(
                "enter a prompt describing the edit",
            ));
        }
        let Some(original) = original else {
            return Err(NexusError::validation("upload an image to edit"));
        };

        let outcome = self
            .client
            .edit_image(&prompt, &original)
            .await
            .map_err(|err| NexusError::transport(err.to_string()))?;

        self.invalidate_pending_capture();
        {
            let mut history = self.history.write().await;
            let mut state = self.state.write().await;
            state.edited = Some(outcome.image.clone());
            state.caption = outcome.caption.clone();
            state.adjustments = Adjustments::default();
            history.push(EditState::generated(outcome.image.clone(), prompt.clone()));
        }
        {
            let mut gallery = self.gallery.write().await;
            gallery.insert(
                0,
                EditGalleryEntry {
                    id: clock::monotonic_millis(),
                    prompt,
                    original,
                    edited: outcome.image.clone(),
                },
            );
            gallery.truncate(EDIT_GALLERY_LIMIT);
        }
        self.persist_gallery().await;
        Ok(outcome)
    }

    /// Steps back in the edit history and restores that snapshot.
    pub async fn undo(&self) -> Option<EditState> {
        self.invalidate_pending_capture();
        let snapshot = self.history.write().await.undo().cloned()?;
        self.apply_snapshot(&snapshot).await;
        Some(snapshot)
    }

    /// Steps forward in the edit history and restores that snapshot.
    pub async fn redo(&self) -> Option<EditState> {
        self.invalidate_pending_capture();
        let snapshot = self.history.write().await.redo().cloned()?;
        self.apply_snapshot(&snapshot).await;
        Some(snapshot)
    }

    pub async fn can_undo(&self) -> bool {
        self.history.read().await.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.history.read().await.can_redo()
    }

    /// Handles a globally intercepted key press, navigating history when it
    /// matches an undo/redo shortcut and history exists in that direction.
    pub async fn handle_shortcut(&self, combo: KeyCombo) -> Option<HistoryAction> {
        match shortcuts::history_action(combo)? {
            HistoryAction::Undo => self.undo().await.map(|_| HistoryAction::Undo),
            HistoryAction::Redo => self.redo().await.map(|_| HistoryAction::Redo),
        }
    }

    /// Restores a completed edit from the gallery as a fresh session seeded
    /// with that snapshot.
    pub async fn select_from_gallery(&self, entry: &EditGalleryEntry) {
        self.invalidate_pending_capture();
        self.clear_auto_save().await;
        {
            let mut history = self.history.write().await;
            let mut state = self.state.write().await;
            state.original = Some(entry.original.clone());
            state.edited = Some(entry.edited.clone());
            state.prompt = entry.prompt.clone();
            state.caption = None;
            state.adjustments = Adjustments::default();
            history.clear();
            history.push(EditState {
                edited_image: Some(entry.edited.clone()),
                prompt: entry.prompt.clone(),
                adjustments: Adjustments::default(),
            });
        }
    }

    pub async fn gallery(&self) -> Vec<EditGalleryEntry> {
        self.gallery.read().await.clone()
    }

    pub async fn clear_gallery(&self) {
        self.gallery.write().await.clear();
        if let Err(err) = self.store.remove(IMAGE_GALLERY_KEY).await {
            tracing::warn!("failed to clear edit gallery: {}", err);
        }
    }

    /// Writes the in-progress session to the auto-save slot.
    ///
    /// Returns `false` without writing when no image is loaded.
    pub async fn auto_save_tick(&self) -> Result<bool> {
        let state = self.state.read().await.clone();
        let Some(original) = state.original else {
            return Ok(false);
        };
        let slot = AutoSaveSlotV1 {
            schema_version: SCHEMA_VERSION.to_string(),
            original,
            edited: state.edited,
            prompt: state.prompt,
            adjustments: state.adjustments,
        };
        let raw = serde_json::to_string(&slot)?;
        self.store.set(EDITOR_AUTOSAVE_KEY, &raw).await?;
        Ok(true)
    }

    /// Spawns the periodic auto-save task.
    pub fn spawn_auto_save(&self) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(AUTO_SAVE_INTERVAL);
            // The immediate first tick would save an empty session.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(err) = service.auto_save_tick().await {
                    tracing::warn!("failed to auto-save editor session: {}", err);
                }
            }
        })
    }

    /// Restores the auto-saved session, if one exists.
    ///
    /// Seeds the history with the restored snapshot so undo has a floor.
    pub async fn restore_auto_save(&self) -> Result<bool> {
        let Some(raw) = self.store.get(EDITOR_AUTOSAVE_KEY).await? else {
            return Ok(false);
        };
        let slot: AutoSaveSlotV1 = serde_json::from_str(&raw)?;
        check_schema_version(&slot.schema_version)?;

        self.invalidate_pending_capture();
        {
            let mut history = self.history.write().await;
            let mut state = self.state.write().await;
            state.original = Some(slot.original);
            state.edited = slot.edited.clone();
            state.prompt = slot.prompt.clone();
            state.caption = None;
            state.adjustments = slot.adjustments;
            history.clear();
            history.push(EditState {
                edited_image: slot.edited,
                prompt: slot.prompt,
                adjustments: slot.adjustments,
            });
        }
        Ok(true)
    }

    pub async fn adjustments(&self) -> Adjustments {
        self.state.read().await.adjustments
    }

    pub async fn edited_image(&self) -> Option<InlineImage> {
        self.state.read().await.edited.clone()
    }

    pub async fn original_image(&self) -> Option<InlineImage> {
        self.state.read().await.original.clone()
    }

    pub async fn caption(&self) -> Option<String> {
        self.state.read().await.caption.clone()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn history_cursor(&self) -> Option<usize> {
        let history = self.history.read().await;
        if history.is_empty() {
            None
        } else {
            Some(history.cursor())
        }
    }

    fn invalidate_pending_capture(&self) {
        self.debounce_generation.fetch_add(1, Ordering::Relaxed);
    }

    async fn apply_snapshot(&self, snapshot: &EditState) {
        let mut state = self.state.write().await;
        state.edited = snapshot.edited_image.clone();
        state.prompt = snapshot.prompt.clone();
        state.adjustments = snapshot.adjustments;
    }

    async fn clear_auto_save(&self) {
        if let Err(err) = self.store.remove(EDITOR_AUTOSAVE_KEY).await {
            tracing::warn!("failed to clear editor auto-save slot: {}", err);
        }
    }

    async fn persist_gallery(&self) {
        let entries = self.gallery.read().await.clone();
        let envelope = EditGalleryV1::from(entries);
        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if let Err(err) = self.store.set(IMAGE_GALLERY_KEY, &raw).await {
                    tracing::warn!("failed to persist edit gallery: {}", err);
                }
            }
            Err(err) => tracing::warn!("failed to encode edit gallery: {}", err),
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
