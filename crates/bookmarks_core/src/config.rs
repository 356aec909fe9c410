//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Turn raw environment values into a typed `CoreConfig`.
//! - Keep environment access at the binary entry point; core code receives
//!   a lookup function instead of reading the process environment.
//!
//! # Invariants
//! - Missing variables fall back to documented defaults.
//! - Invalid values are rejected with the variable name, never ignored.

use crate::db::{open_db_with_timeout, DbResult, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "BOOKMARKS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BOOKMARKS_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "BOOKMARKS_BUSY_TIMEOUT_MS";
pub const ENV_PAGE_SIZE: &str = "BOOKMARKS_PAGE_SIZE";

/// Items per page on the bookmark listing.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl Error for ConfigError {}

/// Settings needed to open storage and start logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Absolute directory for rolling logs; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level).map_err(|message| ConfigError {
                variable: ENV_LOG_LEVEL,
                message,
            })?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(normalize_log_dir(&dir).map_err(|message| ConfigError {
                variable: ENV_LOG_DIR,
                message,
            })?);
        }
        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = parse_positive(ENV_BUSY_TIMEOUT_MS, &raw)?;
            config.busy_timeout = Duration::from_millis(u64::from(millis));
        }
        if let Some(raw) = read(ENV_PAGE_SIZE) {
            config.page_size = parse_positive(ENV_PAGE_SIZE, &raw)?;
        }

        Ok(config)
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        open_db_with_timeout(self.db_path.as_deref(), self.busy_timeout)
    }
}

fn parse_positive(variable: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(0) => Err(ConfigError {
            variable,
            message: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(err) => Err(ConfigError {
            variable,
            message: format!("`{raw}` is not a number: {err}"),
        }),
    }
}
