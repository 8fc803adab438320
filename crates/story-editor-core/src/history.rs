// Re-exports from story-editor-mod-history, specialized for story documents.
pub use story_editor_mod_history::config::{doc_id_for_path, generate_draft_id};
pub use story_editor_mod_history::{HistoryConfig, HistoryEntry, PersistenceLayer, UndoManager};

use crate::document::StoryDocument;

/// Undo history over whole story snapshots.
pub type StoryHistory = UndoManager<StoryDocument>;
