//! Analyzer configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Slot count used when the configuration does not say otherwise.
pub const DEFAULT_POOL_SLOTS: usize = 5;

/// Artifact locations and pool capacities for both model kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Genre classifier weight pack.
    pub genre_model: PathBuf,
    /// Instrument classifier weight pack.
    pub instrument_model: PathBuf,
    /// Preloaded genre model instances.
    pub genre_slots: usize,
    /// Preloaded instrument model instances.
    pub instrument_slots: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            genre_model: PathBuf::from("models/genre.json"),
            instrument_model: PathBuf::from("models/instrument.json"),
            genre_slots: DEFAULT_POOL_SLOTS,
            instrument_slots: DEFAULT_POOL_SLOTS,
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl AnalyzerConfig {
    /// Parse a TOML config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a path when given, defaults when the file is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }
}
