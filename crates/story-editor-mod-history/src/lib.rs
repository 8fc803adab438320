/// Snapshot-based undo/redo history with optional disk persistence.
///
/// Provides an `UndoManager` that keeps whole-state snapshots in memory
/// and can write them to an embedded key-value store (redb) so history
/// survives across editing sessions.
pub mod config;
pub mod entry;
pub mod manager;
pub mod persistence;

pub use config::HistoryConfig;
pub use entry::HistoryEntry;
pub use manager::UndoManager;
pub use persistence::PersistenceLayer;
