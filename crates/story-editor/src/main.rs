mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use story_editor_config::{EditorConfig, IdStrategy};
use story_editor_core::history::{doc_id_for_path, HistoryConfig, PersistenceLayer};
use story_editor_core::{StoryDocument, StorySession};

/// Replays an editing script against a story and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "story-editor", version, about)]
struct Cli {
    /// JSON array of actions and `{"step": ...}` commands.
    script: PathBuf,

    /// Story document to start from instead of the empty story.
    #[arg(long)]
    initial: Option<PathBuf>,

    /// Config file. Defaults to `story-editor.json` next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check document invariants after every step.
    #[arg(long)]
    verify: bool,

    /// Persist undo history in this directory.
    #[arg(long = "history-dir")]
    history_dir: Option<PathBuf>,

    /// History key for the story. Defaults to one derived from the script path.
    #[arg(long = "doc-id")]
    doc_id: Option<String>,

    /// Use `page-1`, `el-1`, ... instead of random ids.
    #[arg(long = "sequential-ids")]
    sequential_ids: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {what} {}", path.display()))
}

fn open_session(cli: &Cli, config: &EditorConfig) -> Result<StorySession> {
    let history_dir = match &cli.history_dir {
        Some(dir) => Some(dir.clone()),
        None if config.history.persist => Some(HistoryConfig::from(config).data_dir),
        None => None,
    };
    let Some(dir) = history_dir else {
        return Ok(StorySession::new(config));
    };

    let persistence = PersistenceLayer::open(&dir)
        .with_context(|| format!("Failed to open history in {}", dir.display()))?;
    let doc_id = cli
        .doc_id
        .clone()
        .unwrap_or_else(|| doc_id_for_path(&cli.script));
    tracing::info!("Using history {doc_id} in {}", dir.display());
    StorySession::open(config, &doc_id, persistence)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(EditorConfig::config_path);
    let mut config = EditorConfig::load_or_create(&config_path);
    if cli.sequential_ids {
        config.id_strategy = IdStrategy::Sequential;
    }

    // Logs go to stderr; stdout carries the document.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::debug!("Loaded config from {}", config_path.display());

    let steps = script::parse(
        &std::fs::read_to_string(&cli.script)
            .with_context(|| format!("Failed to read script {}", cli.script.display()))?,
    )
    .with_context(|| format!("Failed to parse script {}", cli.script.display()))?;

    let mut session = open_session(&cli, &config)?;
    if let Some(path) = &cli.initial {
        let document: StoryDocument = read_json(path, "initial document")?;
        session.reset_document(document);
    }

    script::run(&mut session, steps, cli.verify)?;
    session.flush()?;

    let output = serde_json::to_string_pretty(session.document())
        .context("Failed to serialize document")?;
    println!("{output}");
    Ok(())
}
