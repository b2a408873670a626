//! Configuration to acknowledge user preferences as well as set defaults.
//!
//! We look for a brdedit.toml in the working directory (or an explicit path) and load settings
//! from it. This provides the database location, the model command and its retry behaviour,
//! and display preferences.

use crate::model::RetryPolicy;
use facet::Facet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "brdedit.toml";

#[derive(Facet, Clone, Debug)]
/// User preferences loaded from brdedit.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "brdedit.db".to_string())]
    /// SQLite database holding documents, sections and edit history.
    pub database_path: String,
    #[facet(default = vec!["claude".to_string(), "-p".to_string()])]
    /// Program and arguments that answer a chat transcript on stdin.
    pub model_command: Vec<String>,
    #[facet(default = 120)]
    /// Seconds to wait for a single model call.
    pub model_timeout_secs: u64,
    #[facet(default = 3)]
    /// Model call attempts before giving up.
    pub max_attempts: u32,
    #[facet(default = 500)]
    /// Backoff after the first failed attempt, doubled each retry.
    pub base_delay_ms: u64,
    #[facet(default = 8000)]
    /// Upper bound on a single backoff delay.
    pub max_delay_ms: u64,
    #[facet(default = "Summary unavailable.".to_string())]
    /// Summary stored when the model cannot produce one.
    pub summary_placeholder: String,
    #[facet(default = 100)]
    /// Maximum line width when printing outlines.
    pub wrap_width: usize,
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file is not valid configuration.
    #[error("invalid configuration in {path}: {message}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl Config {
    /// Load configuration from `path`, or from brdedit.toml if present.
    ///
    /// A missing brdedit.toml yields the defaults; an explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or any file read is unreadable or
    /// malformed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents, &path),
            Err(e) if !required && e.kind() == io::ErrorKind::NotFound => {
                Self::from_toml("", &path)
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        facet_toml::from_str::<Self>(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    #[must_use]
    /// Retry behaviour for model calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    #[must_use]
    /// Timeout for a single model call.
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
