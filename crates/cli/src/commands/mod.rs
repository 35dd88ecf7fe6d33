//! Command implementations and the plumbing they share: config loading,
//! store selection, engine construction and output rendering.

pub mod assignment;
pub mod balance;
pub mod chore;
pub mod init;
pub mod pool;
pub mod status;

use choreboard_activity::{ActivityLog, TracingSink};
use choreboard_config::{AppConfig, StoreBackend};
use choreboard_core::{ActivitySink, ChoreRepository, SystemClock};
use choreboard_engine::ChoreEngine;
use choreboard_store::{InMemoryStore, SqliteStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Renders command results either for humans or as JSON on stdout.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print `value` as pretty JSON, or hand it to `human` for text output.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> CommandResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

/// The config file path: the explicit one, or `~/.choreboard/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the config file, then apply environment overrides on top of it.
pub fn load_config(explicit: Option<&Path>) -> CommandResult<AppConfig> {
    Ok(AppConfig::load_with_overrides(&config_path(explicit))?)
}

pub async fn open_store(config: &AppConfig) -> CommandResult<Arc<dyn ChoreRepository>> {
    let store: Arc<dyn ChoreRepository> = match config.store.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.store.path).await?),
        StoreBackend::Memory => {
            warn!("Using the in-memory store; nothing will persist past this command");
            Arc::new(InMemoryStore::new())
        }
    };
    Ok(store)
}

/// Build an engine over the configured store, with the system clock and
/// an activity log that mirrors to tracing when enabled.
pub async fn engine(explicit: Option<&Path>) -> CommandResult<ChoreEngine> {
    let config = load_config(explicit)?;
    let repo = open_store(&config).await?;

    let mut sinks: Vec<Box<dyn ActivitySink>> = Vec::new();
    if config.activity.tracing {
        sinks.push(Box::new(TracingSink));
    }
    let activity: Arc<dyn ActivitySink> =
        Arc::new(ActivityLog::with_sinks(config.activity.retain, sinks));

    debug!(backend = ?config.store.backend, "Engine ready");
    let engine = ChoreEngine::new(repo, activity, Arc::new(SystemClock), &config.engine)
        .map_err(failure)?;
    Ok(engine)
}

/// Prefix an engine error with its stable code, e.g. `already_claimed: ...`.
pub fn failure(e: choreboard_core::Error) -> Box<dyn std::error::Error> {
    format!("{}: {e}", e.kind().code()).into()
}
