//! redb-backed storage for history entries.
//!
//! One database file per data directory, shared by every story:
//! - `history`: `(doc_id, seq)` → JSON-encoded [`HistoryEntry`]
//! - `meta`: `doc_id` → bincode-encoded [`StoredMeta`]
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entry::HistoryEntry;

const ENTRIES: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("history");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

const DB_FILE: &str = "story-history.redb";

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    next_seq: u64,
}

/// Shared handle to the history database.
pub struct PersistenceLayer {
    db: Database,
}

impl std::fmt::Debug for PersistenceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceLayer").finish_non_exhaustive()
    }
}

fn stored_seqs(txn: &WriteTransaction, doc_id: &str) -> Result<Vec<u64>> {
    let table = txn.open_table(ENTRIES).context("Failed to open history table")?;
    let range = table
        .range((doc_id, 0)..=(doc_id, u64::MAX))
        .context("Failed to scan history table")?;
    range
        .map(|item| {
            item.map(|(key, _)| key.value().1)
                .context("Failed to read history key")
        })
        .collect()
}

fn clear_entries(txn: &WriteTransaction, doc_id: &str) -> Result<()> {
    let seqs = stored_seqs(txn, doc_id)?;
    let mut table = txn.open_table(ENTRIES).context("Failed to open history table")?;
    for seq in seqs {
        table
            .remove((doc_id, seq))
            .with_context(|| format!("Failed to remove history entry {doc_id}/{seq}"))?;
    }
    Ok(())
}

fn put_entries<S: Serialize>(
    txn: &WriteTransaction,
    doc_id: &str,
    entries: &[HistoryEntry<S>],
) -> Result<()> {
    let mut table = txn.open_table(ENTRIES).context("Failed to open history table")?;
    for entry in entries {
        let bytes = serde_json::to_vec(entry)
            .with_context(|| format!("Failed to encode history entry {}", entry.seq))?;
        table
            .insert((doc_id, entry.seq), bytes.as_slice())
            .with_context(|| format!("Failed to store history entry {doc_id}/{}", entry.seq))?;
    }
    Ok(())
}

fn put_meta(txn: &WriteTransaction, doc_id: &str, next_seq: u64) -> Result<()> {
    let bytes = bincode::serialize(&StoredMeta { next_seq }).context("Failed to encode metadata")?;
    let mut table = txn.open_table(META).context("Failed to open meta table")?;
    table
        .insert(doc_id, bytes.as_slice())
        .context("Failed to store metadata")?;
    Ok(())
}

impl PersistenceLayer {
    /// Opens `story-history.redb` in `data_dir`, creating the directory,
    /// the file and both tables as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let path = data_dir.join(DB_FILE);
        let db = Database::create(&path)
            .with_context(|| format!("Failed to open history database {}", path.display()))?;

        let layer = Self { db };
        layer.write("create tables", |txn| {
            txn.open_table(ENTRIES).context("Failed to create history table")?;
            txn.open_table(META).context("Failed to create meta table")?;
            Ok(())
        })?;

        tracing::debug!("Opened history database {}", path.display());
        Ok(Arc::new(layer))
    }

    /// Runs `f` in a write transaction and commits it if `f` succeeds.
    fn write<F>(&self, what: &str, f: F) -> Result<()>
    where
        F: FnOnce(&WriteTransaction) -> Result<()>,
    {
        let txn = self
            .db
            .begin_write()
            .with_context(|| format!("Failed to start transaction ({what})"))?;
        f(&txn)?;
        txn.commit()
            .with_context(|| format!("Failed to commit transaction ({what})"))
    }

    fn read(&self) -> Result<ReadTransaction> {
        self.db
            .begin_read()
            .context("Failed to start read transaction")
    }

    /// Upserts `entries` for `doc_id`. Entries with other sequence numbers
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the transaction fails.
    pub fn write_entries<S: Serialize>(
        &self,
        doc_id: &str,
        entries: &[HistoryEntry<S>],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.write("write entries", |txn| put_entries(txn, doc_id, entries))
    }

    /// Makes `entries` the complete stored history of `doc_id` and records
    /// `next_seq`, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the transaction fails.
    pub fn replace_entries<S: Serialize>(
        &self,
        doc_id: &str,
        entries: &[HistoryEntry<S>],
        next_seq: u64,
    ) -> Result<()> {
        self.write("replace entries", |txn| {
            clear_entries(txn, doc_id)?;
            put_entries(txn, doc_id, entries)?;
            put_meta(txn, doc_id, next_seq)
        })
    }

    /// Stored entries of `doc_id` in sequence order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or decoding fails.
    pub fn read_entries<S: DeserializeOwned>(&self, doc_id: &str) -> Result<Vec<HistoryEntry<S>>> {
        let txn = self.read()?;
        let table = txn.open_table(ENTRIES).context("Failed to open history table")?;
        let range = table
            .range((doc_id, 0)..=(doc_id, u64::MAX))
            .context("Failed to scan history table")?;

        let mut entries = Vec::new();
        for item in range {
            let (key, value) = item.context("Failed to read history entry")?;
            let seq = key.value().1;
            let entry = serde_json::from_slice(value.value())
                .with_context(|| format!("Corrupt history entry {doc_id}/{seq}"))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn count_entries(&self, doc_id: &str) -> Result<usize> {
        let txn = self.read()?;
        let table = txn.open_table(ENTRIES).context("Failed to open history table")?;
        let range = table
            .range((doc_id, 0)..=(doc_id, u64::MAX))
            .context("Failed to scan history table")?;
        Ok(range.count())
    }

    /// Forgets everything stored for `doc_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.write("delete document", |txn| {
            clear_entries(txn, doc_id)?;
            let mut meta = txn.open_table(META).context("Failed to open meta table")?;
            meta.remove(doc_id).context("Failed to remove metadata")?;
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns an error if encoding or the transaction fails.
    pub fn save_meta(&self, doc_id: &str, next_seq: u64) -> Result<()> {
        self.write("save metadata", |txn| put_meta(txn, doc_id, next_seq))
    }

    /// The next sequence number recorded for `doc_id`, or `None` for a
    /// story that was never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or decoding fails.
    pub fn load_meta(&self, doc_id: &str) -> Result<Option<u64>> {
        let txn = self.read()?;
        let table = txn.open_table(META).context("Failed to open meta table")?;
        let Some(value) = table.get(doc_id).context("Failed to read metadata")? else {
            return Ok(None);
        };
        let meta: StoredMeta = bincode::deserialize(value.value())
            .with_context(|| format!("Corrupt metadata for {doc_id}"))?;
        Ok(Some(meta.next_seq))
    }

    /// Ids of every story with saved metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn list_documents(&self) -> Result<Vec<String>> {
        let txn = self.read()?;
        let table = txn.open_table(META).context("Failed to open meta table")?;
        let iter = table.iter().context("Failed to scan meta table")?;
        iter.map(|item| {
            item.map(|(key, _)| key.value().to_string())
                .context("Failed to read meta key")
        })
        .collect()
    }
}
