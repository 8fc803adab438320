/// A recorded snapshot and its position in the history sequence.
use serde::{Deserialize, Serialize};

/// One undo step: the full state that was current after an edit.
///
/// Snapshots are stored whole rather than as diffs, so restoring an entry
/// never depends on the entries around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<S> {
    /// Monotonic sequence number assigned by the `UndoManager`.
    pub seq: u64,
    /// The recorded state.
    pub snapshot: S,
}

impl<S> HistoryEntry<S> {
    pub fn new(seq: u64, snapshot: S) -> Self {
        Self { seq, snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: i64,
        label: String,
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = HistoryEntry::new(7, Counter { value: 3, label: "x".into() });
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["seq"], 7);
        assert_eq!(json["snapshot"]["value"], 3);
        assert_eq!(json["snapshot"]["label"], "x");
    }

    #[test]
    fn test_entry_with_free_form_snapshot() {
        // Snapshots may hold arbitrary JSON, which is why entries are stored
        // as JSON rather than bincode.
        let snapshot = serde_json::json!({ "story": { "title": "Hello", "tags": [1, 2] } });
        let entry = HistoryEntry::new(1, snapshot.clone());
        let bytes = serde_json::to_vec(&entry).expect("serialize");
        let decoded: HistoryEntry<serde_json::Value> =
            serde_json::from_slice(&bytes).expect("deserialize");
        assert_eq!(decoded.snapshot, snapshot);
        assert_eq!(decoded.seq, 1);
    }
}
