/// Editor configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the directory used for history data.
pub const DATA_DIR_ENV: &str = "STORY_EDITOR_DATA_DIR";

/// Undo/redo history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Max number of undo steps kept per story.
    pub max_history_depth: usize,
    /// Records closer together than this are merged into one undo step.
    /// 0 disables time-based grouping.
    pub group_timeout_ms: u64,
    /// Whether history is written to disk between sessions.
    pub persist: bool,
    /// Root directory for the history database. Empty = resolved at runtime.
    pub data_dir: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_history_depth: 50,
            group_timeout_ms: 0,
            persist: false,
            data_dir: String::new(),
        }
    }
}

/// Canvas dimensions used when new pages and full-bleed elements are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub page_width: f32,
    pub page_height: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            page_width: 412.0,
            page_height: 732.0,
        }
    }
}

/// How new page and element ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random v4 UUIDs.
    #[default]
    Uuid,
    /// `el-1`, `el-2`, ... Deterministic; used for scripted runs.
    Sequential,
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistorySettings,
    pub canvas: CanvasSettings,
    pub id_strategy: IdStrategy,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistorySettings::default(),
            canvas: CanvasSettings::default(),
            id_strategy: IdStrategy::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Returns the config file path: exe directory + `story-editor.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("story-editor.json")))
            .unwrap_or_else(|| PathBuf::from("story-editor.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<EditorConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Broken file is left alone
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.history.max_history_depth = self.history.max_history_depth.clamp(1, 10_000);
        self.history.group_timeout_ms = self.history.group_timeout_ms.min(10_000);

        let defaults = CanvasSettings::default();
        if !(self.canvas.page_width.is_finite() && self.canvas.page_width > 0.0) {
            self.canvas.page_width = defaults.page_width;
        }
        if !(self.canvas.page_height.is_finite() && self.canvas.page_height > 0.0) {
            self.canvas.page_height = defaults.page_height;
        }

        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }
}

/// Resolves the default data directory.
///
/// Resolution order:
/// 1. `STORY_EDITOR_DATA_DIR` environment variable
/// 2. The platform data directory (`dirs::data_dir()`) + `story-editor`
/// 3. `.data/` in the working directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("story-editor"))
        .unwrap_or_else(|| PathBuf::from(".data"))
}
