//! Editing session: a story store plus its undo history.
//!
//! Every dispatch that changes the document records a snapshot. Undo and
//! redo install snapshots through the internal restore action with
//! recording paused, so history never records its own restores.

use std::sync::Arc;

use anyhow::{Context, Result};
use story_editor_config::{CanvasSettings, EditorConfig};
use tracing::{debug, warn};

use crate::action::Action;
use crate::api::{Dispatch, ExposedActions, InternalActions};
use crate::document::StoryDocument;
use crate::history::{generate_draft_id, HistoryConfig, PersistenceLayer, StoryHistory};
use crate::ids::{id_generator_for, IdGenerator};
use crate::store::{StoryStore, SubscriptionId};

/// Dispatcher that applies actions to a store and records the results.
pub struct Recorder<'s> {
    store: &'s mut StoryStore,
    history: &'s mut StoryHistory,
}

impl Dispatch for Recorder<'_> {
    fn dispatch(&mut self, action: Action) {
        if self.store.apply(action) {
            self.history.record(self.store.document().clone());
        }
    }
}

/// A story being edited, with undo/redo.
pub struct StorySession {
    store: StoryStore,
    history: StoryHistory,
    ids: Box<dyn IdGenerator>,
    canvas: CanvasSettings,
}

impl std::fmt::Debug for StorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorySession")
            .field("store", &self.store)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl StorySession {
    /// Creates an empty story with in-memory-only history.
    pub fn new(config: &EditorConfig) -> Self {
        let history = StoryHistory::new(generate_draft_id(), HistoryConfig::from(config), None);
        Self::with_parts(StoryStore::new(), history, id_generator_for(config.id_strategy))
            .with_canvas(config.canvas.clone())
    }

    /// Assembles a session from its parts.
    ///
    /// The store's current document becomes the history baseline unless the
    /// history already has a present snapshot.
    pub fn with_parts(
        store: StoryStore,
        mut history: StoryHistory,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        if history.present().is_none() {
            history.reset(store.document().clone());
        }
        Self {
            store,
            history,
            ids,
            canvas: CanvasSettings::default(),
        }
    }

    /// Sets the page dimensions used for new background elements.
    pub fn with_canvas(mut self, canvas: CanvasSettings) -> Self {
        self.canvas = canvas;
        self
    }

    /// Opens the story `doc_id` with persistent history.
    ///
    /// The newest stored snapshot becomes the document. A story with no
    /// stored history starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history cannot be read.
    pub fn open(
        config: &EditorConfig,
        doc_id: &str,
        persistence: Arc<PersistenceLayer>,
    ) -> Result<Self> {
        let history = StoryHistory::load_or_new(
            doc_id.to_string(),
            HistoryConfig::from(config),
            Some(persistence),
        )
        .with_context(|| format!("Failed to open history for story {doc_id}"))?;
        let store = match history.present() {
            Some(doc) => {
                debug!(
                    "Resuming story {doc_id} with {} undo steps",
                    history.undo_depth()
                );
                StoryStore::with_document(doc.clone())
            }
            None => StoryStore::new(),
        };
        Ok(
            Self::with_parts(store, history, id_generator_for(config.id_strategy))
                .with_canvas(config.canvas.clone()),
        )
    }

    /// Replaces the document and starts history over from it.
    pub fn reset_document(&mut self, document: StoryDocument) {
        self.history.pause_recording();
        self.internal().restore(document);
        self.history.resume_recording();
        self.history.reset(self.store.document().clone());
    }

    /// The public editing API. Changes it makes are recorded for undo.
    pub fn api(&mut self) -> ExposedActions<'_, Recorder<'_>> {
        let recorder = Recorder {
            store: &mut self.store,
            history: &mut self.history,
        };
        ExposedActions::new(recorder, self.ids.as_mut())
            .with_page_size(self.canvas.page_width, self.canvas.page_height)
    }

    /// The internal API. Changes it makes are recorded for undo unless
    /// recording is paused.
    pub fn internal(&mut self) -> InternalActions<Recorder<'_>> {
        InternalActions::new(Recorder {
            store: &mut self.store,
            history: &mut self.history,
        })
    }

    pub fn state(&self) -> Arc<StoryDocument> {
        self.store.state()
    }

    pub fn document(&self) -> &StoryDocument {
        self.store.document()
    }

    pub fn store(&self) -> &StoryStore {
        &self.store
    }

    pub fn history(&self) -> &StoryHistory {
        &self.history
    }

    pub fn doc_id(&self) -> &str {
        self.history.doc_id()
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoryDocument) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Performs undo. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.install(snapshot);
        true
    }

    /// Performs redo. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.install(snapshot);
        true
    }

    fn install(&mut self, snapshot: StoryDocument) {
        self.history.pause_recording();
        self.internal().restore(snapshot);
        self.history.resume_recording();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Ends the current undo group, e.g. when a drag gesture finishes.
    pub fn break_undo_group(&mut self) {
        self.history.force_group_break();
    }

    /// Writes history to disk. No-op for in-memory sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails.
    pub fn flush(&mut self) -> Result<()> {
        self.history
            .flush()
            .with_context(|| format!("Failed to save history for story {}", self.doc_id()))
    }

    /// Drops all recorded history, in memory and on disk, keeping the
    /// current document as the new baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if disk cleanup fails.
    pub fn delete_history(&mut self) -> Result<()> {
        self.history.delete_history()?;
        self.history.reset(self.store.document().clone());
        Ok(())
    }
}

impl Dispatch for StorySession {
    fn dispatch(&mut self, action: Action) {
        Recorder {
            store: &mut self.store,
            history: &mut self.history,
        }
        .dispatch(action);
    }
}

impl Drop for StorySession {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("{e:#}");
        }
    }
}
