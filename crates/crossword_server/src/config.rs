//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ServerConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Settings for the crossword binary.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SQLite database path.
    #[serde(default = "default_database_url")]
    database_url: String,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,

    /// Directory searched for relative puzzle file paths.
    #[serde(default)]
    puzzle_dir: Option<PathBuf>,
}

fn default_database_url() -> String {
    "crossword.db".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            log_filter: default_log_filter(),
            puzzle_dir: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Resolves the effective configuration.
    ///
    /// Reads `path` if it exists, otherwise starts from defaults, then applies
    /// the `DATABASE_URL` environment override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                debug!(path = %path.display(), "Config file absent, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        let config = config.with_database_override(std::env::var(DATABASE_URL_ENV).ok());
        info!(database_url = %config.database_url, "Config resolved");
        Ok(config)
    }

    /// Replaces the database path when `database_url` is set and non-empty.
    pub fn with_database_override(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "Database path overridden");
            self.database_url = url;
        }
        self
    }

    /// Resolves a puzzle path against [`ServerConfig::puzzle_dir`].
    pub fn puzzle_path(&self, path: &Path) -> PathBuf {
        match &self.puzzle_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_parses_all_keys() {
        let config = ServerConfig::from_toml_str(
            r#"
            database_url = "games.db"
            log_filter = "debug"
            puzzle_dir = "puzzles"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_url(), "games.db");
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.puzzle_path(Path::new("mini.toml")), PathBuf::from("puzzles/mini.toml"));
        assert_eq!(config.puzzle_path(Path::new("/abs/mini.toml")), PathBuf::from("/abs/mini.toml"));
    }

    #[test]
    fn test_database_override() {
        let config = ServerConfig::default().with_database_override(Some("other.db".into()));
        assert_eq!(config.database_url(), "other.db");
        let config = ServerConfig::default().with_database_override(Some("  ".into()));
        assert_eq!(config.database_url(), "crossword.db");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(ServerConfig::from_toml_str("database_url = [").is_err());
    }
}
