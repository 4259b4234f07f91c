//! Board configuration loaded from the process environment.
//!
//! # Invariants
//! - Unset variables fall back to defaults; malformed values are errors,
//!   never panics and never silent defaults.

use crate::db::DEFAULT_POOL_SIZE;
use crate::logging::{default_log_level, normalize_level};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "QUOTEVOTE_DB_PATH";
pub const ENV_POOL_SIZE: &str = "QUOTEVOTE_POOL_SIZE";
pub const ENV_LOG_LEVEL: &str = "QUOTEVOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "QUOTEVOTE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got `{value}`")]
    InvalidPoolSize { key: &'static str, value: String },
    #[error("{key} has unsupported log level `{value}`")]
    InvalidLogLevel { key: &'static str, value: String },
}

/// Runtime settings for opening a [`crate::QuoteBoard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// SQLite file; `None` keeps the board in memory.
    pub db_path: Option<PathBuf>,
    pub pool_size: u32,
    pub log_level: String,
    /// Directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            pool_size: DEFAULT_POOL_SIZE,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BoardConfig {
    /// Reads `QUOTEVOTE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = read(ENV_POOL_SIZE) {
            config.pool_size = raw
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPoolSize {
                    key: ENV_POOL_SIZE,
                    value: raw,
                })?;
        }

        if let Some(raw) = read(ENV_LOG_LEVEL) {
            let level = normalize_level(&raw).map_err(|_| ConfigError::InvalidLogLevel {
                key: ENV_LOG_LEVEL,
                value: raw.clone(),
            })?;
            config.log_level = level.to_string();
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }
}
