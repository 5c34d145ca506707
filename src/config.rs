//! Engine configuration
//!
//! Every knob has a default; a YAML file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunable constants of the annotation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest gap (bytes of whitespace/punctuation) between two picked
    /// words that still joins them into one run
    pub adjacency_gap: usize,
    /// Window within which a repeated selection of the same text is ignored
    pub dedup_window_ms: i64,
    /// Word limit for extracted sentence context
    pub context_max_words: usize,
    /// Records older than this are dropped on load; 0 keeps everything
    pub retention_days: i64,
    /// Records per file in batched export
    pub batch_size: usize,
    /// Whether batched export also writes a master file
    pub include_master: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adjacency_gap: 5,
            dedup_window_ms: 1000,
            context_max_words: 18,
            retention_days: 7,
            batch_size: 25,
            include_master: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from YAML text. An empty document yields defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Load from `path` if given, else from the default location if a file
    /// exists there, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(default) if default.is_file() => Self::load(default),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.dedup_window_ms)
    }

    /// Retention window, or `None` when eviction is disabled.
    pub fn retention(&self) -> Option<chrono::Duration> {
        (self.retention_days > 0).then(|| chrono::Duration::days(self.retention_days))
    }
}

/// Default configuration file (`<config_dir>/lexspan/config.yaml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lexspan").join("config.yaml"))
}
