//! Server configuration from the environment, plus task file loading.

use std::path::{Path, PathBuf};

use retrigger_core::{CoreError, TaskEntry, TaskSpec};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// An environment variable holds an unparseable value.
    #[error("invalid value for {var}: '{value}'")]
    InvalidVar { var: &'static str, value: String },

    /// The task file could not be read.
    #[error("failed to read task file '{path}': {source}")]
    TaskFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The task file is not a valid JSON task list.
    #[error("failed to parse task file '{path}': {source}")]
    TaskFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A task entry failed validation.
    #[error(transparent)]
    Task(#[from] CoreError),
}

/// Optional notification channel credentials.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token.
    pub bot_token: String,

    /// Chat identifier messages are sent to.
    pub chat_id: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the workflow dispatch API.
    pub github_token: String,

    /// Notification channel; None leaves notifications disabled.
    pub telegram: Option<TelegramConfig>,

    /// JSON task list path.
    pub tasks_file: PathBuf,

    /// Cooldown store path (redb database file).
    pub store_path: PathBuf,

    /// Maximum tasks in flight per batch.
    pub concurrency: usize,

    /// Seconds between scheduled batch runs.
    pub interval_secs: u64,

    /// HTTP bind address.
    pub bind_addr: String,
}

impl Config {
    /// Load the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let github_token = lookup("GITHUB_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("GITHUB_TOKEN"))?;

        // Notifications are silently disabled unless both halves are set.
        let telegram = match (
            lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.is_empty()),
            lookup("TELEGRAM_CHAT_ID").filter(|v| !v.is_empty()),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Ok(Self {
            github_token,
            telegram,
            tasks_file: lookup("RETRIGGER_TASKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tasks.json")),
            store_path: lookup("RETRIGGER_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("cooldown.redb")),
            concurrency: parse_var(&lookup, "RETRIGGER_CONCURRENCY", 4)?,
            interval_secs: parse_var(&lookup, "RETRIGGER_INTERVAL_SECS", 300)?,
            bind_addr: lookup("RETRIGGER_BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        None => Ok(default),
    }
}

/// Load and validate the task list from a JSON file.
pub fn load_tasks(path: &Path) -> Result<Vec<TaskSpec>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::TaskFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<TaskEntry> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::TaskFileParse {
            path: path.to_path_buf(),
            source,
        })?;
    entries
        .into_iter()
        .map(|entry| entry.into_spec().map_err(ConfigError::from))
        .collect()
}
