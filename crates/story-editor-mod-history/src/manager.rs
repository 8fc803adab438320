//! Snapshot-based undo/redo manager.
//!
//! The manager keeps the present snapshot plus two stacks of earlier and
//! later snapshots. Undo and redo hand back whole snapshots for the caller to
//! install; the manager never interprets them.
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HistoryConfig;
use crate::entry::HistoryEntry;
use crate::persistence::PersistenceLayer;

#[derive(Clone, Copy)]
enum Direction {
    Back,
    Forward,
}

/// Undo/redo state for one story, keyed by `doc_id` when persisted.
pub struct UndoManager<S> {
    /// Oldest first.
    undo_stack: Vec<HistoryEntry<S>>,
    /// Top is the most recently undone snapshot.
    redo_stack: Vec<HistoryEntry<S>>,
    present: Option<HistoryEntry<S>>,
    next_seq: u64,
    doc_id: String,
    /// Off while a snapshot is being installed.
    recording: bool,
    last_record_time: Option<Instant>,
    config: HistoryConfig,
    persistence: Option<Arc<PersistenceLayer>>,
    /// Set when memory and disk disagree.
    dirty: bool,
}

impl<S> std::fmt::Debug for UndoManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "UndoManager({}: {} undo, {} redo, seq {}{})",
            self.doc_id,
            self.undo_stack.len(),
            self.redo_stack.len(),
            self.next_seq,
            if self.dirty { ", dirty" } else { "" }
        )
    }
}

impl<S: Clone> UndoManager<S> {
    /// An empty manager. Without `persistence` nothing reaches disk.
    pub fn new(
        doc_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            present: None,
            next_seq: 0,
            doc_id,
            recording: true,
            last_record_time: None,
            config,
            persistence,
            dirty: false,
        }
    }

    /// Default config, no persistence.
    pub fn in_memory() -> Self {
        Self::new(String::from("scratch"), HistoryConfig::default(), None)
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Returns the present snapshot, if any has been recorded.
    pub fn present(&self) -> Option<&S> {
        self.present.as_ref().map(|e| &e.snapshot)
    }

    /// Drops all history and makes `snapshot` the baseline.
    ///
    /// The baseline can be returned to by undo but is never undone past.
    pub fn reset(&mut self, snapshot: S) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.present = Some(self.next_entry(snapshot));
        self.last_record_time = None;
        self.dirty = true;
    }

    /// Records a new present snapshot.
    ///
    /// The previous present becomes an undo step, unless this record falls
    /// within the grouping timeout of the previous one, in which case it
    /// replaces the present in place. Clears the redo stack.
    pub fn record(&mut self, snapshot: S) {
        if !self.recording {
            return;
        }

        let now = Instant::now();
        let Some(previous) = self.present.take() else {
            self.present = Some(self.next_entry(snapshot));
            self.dirty = true;
            return;
        };

        let timeout = Duration::from_millis(self.config.group_timeout_ms);
        let grouped = self
            .last_record_time
            .is_some_and(|last| now.duration_since(last) < timeout);

        if grouped {
            self.present = Some(HistoryEntry::new(previous.seq, snapshot));
        } else {
            self.undo_stack.push(previous);
            self.present = Some(self.next_entry(snapshot));
        }

        self.last_record_time = Some(now);
        self.redo_stack.clear();
        self.dirty = true;

        if self.undo_stack.len() > self.config.max_history_depth {
            let excess = self.undo_stack.len() - self.config.max_history_depth;
            self.undo_stack.drain(..excess);
        }
    }

    /// The next record starts a new undo step regardless of timing.
    pub fn force_group_break(&mut self) {
        self.last_record_time = None;
    }

    /// Moves the present onto the redo stack and returns the previous
    /// snapshot for the caller to install.
    pub fn undo(&mut self) -> Option<S> {
        let target = self.undo_stack.pop()?;
        Some(self.install(target, Direction::Back))
    }

    /// Inverse of [`undo`](Self::undo).
    pub fn redo(&mut self) -> Option<S> {
        let target = self.redo_stack.pop()?;
        Some(self.install(target, Direction::Forward))
    }

    fn install(&mut self, target: HistoryEntry<S>, direction: Direction) -> S {
        let snapshot = target.snapshot.clone();
        if let Some(previous) = self.present.replace(target) {
            match direction {
                Direction::Back => self.redo_stack.push(previous),
                Direction::Forward => self.undo_stack.push(previous),
            }
        }
        self.last_record_time = None;
        self.dirty = true;
        snapshot
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps available.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Makes [`record`](Self::record) a no-op until
    /// [`resume_recording`](Self::resume_recording).
    pub fn pause_recording(&mut self) {
        self.recording = false;
    }

    pub fn resume_recording(&mut self) {
        self.recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Forgets every snapshot, including the present, in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        *self = Self::new(
            std::mem::take(&mut self.doc_id),
            self.config.clone(),
            self.persistence.take(),
        );
        match &self.persistence {
            Some(pl) => pl
                .delete_document(&self.doc_id)
                .with_context(|| format!("Failed to delete stored history of {}", self.doc_id)),
            None => Ok(()),
        }
    }

    /// Alias of [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Returns an error if the stored history cannot be removed.
    pub fn delete_history(&mut self) -> Result<()> {
        self.clear()
    }

    fn next_entry(&mut self, snapshot: S) -> HistoryEntry<S> {
        let entry = HistoryEntry::new(self.next_seq, snapshot);
        self.next_seq += 1;
        entry
    }
}

impl<S: Clone + DeserializeOwned> UndoManager<S> {
    /// Loads existing history from disk, or creates a fresh manager.
    ///
    /// The newest stored entry becomes the present snapshot and the rest
    /// become undo steps. The redo stack is never persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(
        doc_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Result<Self> {
        let mut mgr = Self::new(doc_id, config, persistence);
        let Some(pl) = mgr.persistence.clone() else {
            return Ok(mgr);
        };

        let Some(next_seq) = pl
            .load_meta(&mgr.doc_id)
            .context("Failed to load document metadata")?
        else {
            return Ok(mgr);
        };

        let mut entries: Vec<HistoryEntry<S>> = pl
            .read_entries(&mgr.doc_id)
            .context("Failed to load history from disk")?;
        mgr.present = entries.pop();
        let skip = entries.len().saturating_sub(mgr.config.max_history_depth);
        mgr.undo_stack = entries.into_iter().skip(skip).collect();
        mgr.next_seq = next_seq;
        tracing::debug!(
            "Loaded {} history entries for {}",
            mgr.undo_stack.len() + usize::from(mgr.present.is_some()),
            mgr.doc_id
        );
        Ok(mgr)
    }
}

impl<S: Clone + Serialize> UndoManager<S> {
    /// Writes the undo stack and present snapshot to disk.
    ///
    /// No-op if the manager is in-memory-only or nothing has changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(pl) = &self.persistence {
            let mut entries: Vec<HistoryEntry<S>> = self.undo_stack.clone();
            entries.extend(self.present.iter().cloned());
            pl.replace_entries(&self.doc_id, &entries, self.next_seq)
                .context("Failed to flush history to disk")?;
            self.dirty = false;
        }
        Ok(())
    }
}
