/// Configuration for the story editor, stored as a JSON file.
pub mod config;

pub use config::{
    resolve_data_dir, CanvasSettings, EditorConfig, HistorySettings, IdStrategy, DATA_DIR_ENV,
};
