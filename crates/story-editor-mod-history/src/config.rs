/// Configuration and id helpers for the history system.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use story_editor_config::{resolve_data_dir, EditorConfig, HistorySettings};

/// Maximum number of undo steps kept per story.
const DEFAULT_MAX_HISTORY_DEPTH: usize = 50;

/// Time window in milliseconds for grouping consecutive records
/// into a single undo step. 0 = every record is its own step.
const DEFAULT_GROUP_TIMEOUT_MS: u64 = 0;

/// Configuration for the history system.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Max undo steps (the present snapshot is not counted).
    pub max_history_depth: usize,
    /// Grouping timeout in milliseconds.
    pub group_timeout_ms: u64,
    /// Root directory for the persistence database.
    pub data_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
            group_timeout_ms: DEFAULT_GROUP_TIMEOUT_MS,
            data_dir: resolve_data_dir(),
        }
    }
}

impl HistoryConfig {
    /// Builds a history config from the editor's `history` settings.
    pub fn from_settings(settings: &HistorySettings) -> Self {
        let data_dir = if settings.data_dir.is_empty() {
            resolve_data_dir()
        } else {
            PathBuf::from(&settings.data_dir)
        };
        Self {
            max_history_depth: settings.max_history_depth.max(1),
            group_timeout_ms: settings.group_timeout_ms,
            data_dir,
        }
    }
}

impl From<&EditorConfig> for HistoryConfig {
    fn from(config: &EditorConfig) -> Self {
        Self::from_settings(&config.history)
    }
}

/// Generates a document ID for a story snapshot file on disk.
///
/// Uses a hash of the canonical path for stability across sessions.
pub fn doc_id_for_path(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("story-{:016x}", hasher.finish())
}

/// Counter for generating unique ids for stories that have no file yet.
static DRAFT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a unique document ID for a new, never-saved story.
pub fn generate_draft_id() -> String {
    let count = DRAFT_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("draft-{count}")
}
