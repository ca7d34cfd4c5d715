//! Engine configuration
//!
//! Defaults work out of the box; a JSON file can override any field and the
//! `CLIMATE_RISK_ARCHIVE_DIR` environment variable overrides the archive root.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use types::scenario::Scenario;

/// Environment variable overriding [`EngineConfig::archive_root`]
pub const ARCHIVE_DIR_ENV: &str = "CLIMATE_RISK_ARCHIVE_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Risk engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `{SCENARIO}/{stem}.grid.zst` archives
    pub archive_root: PathBuf,
    /// Scenarios composed when a request does not name any
    pub default_scenarios: Vec<Scenario>,
    /// Worker threads used by batch precompute
    pub batch_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("data/climate"),
            default_scenarios: Scenario::ALL.to_vec(),
            batch_workers: 4,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(ARCHIVE_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.archive_root = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn with_archive_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.archive_root = root.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_scenarios.is_empty() {
            return Err(ConfigError::Invalid(
                "default_scenarios must not be empty".to_string(),
            ));
        }
        if self.batch_workers == 0 {
            return Err(ConfigError::Invalid(
                "batch_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
