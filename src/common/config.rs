//! Settings file handling
//!
//! Settings live in `config.toml` under the platform config dir. Every field
//! has a default so a missing or partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{config_path, default_storage_dir, log_dir};
use super::Result;

/// Main settings structure
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// Response storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Execution log settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Where raw responses are written
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// Rotation policy for the execution log
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Execution log settings
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// JSON-lines execution log; disabled when no path can be determined
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            rotation: LogRotation::default(),
        }
    }
}

fn default_log_file() -> Option<PathBuf> {
    log_dir().map(|d| d.join("execution.log"))
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Per-command budget
    #[serde(default = "default_command")]
    pub command_secs: u64,

    /// Whole-run budget, checked between scenarios
    #[serde(default = "default_run")]
    pub run_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: default_command(),
            run_secs: default_run(),
        }
    }
}

fn default_command() -> u64 {
    30
}
fn default_run() -> u64 {
    600
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn run(&self) -> Duration {
        Duration::from_secs(self.run_secs)
    }
}

impl Settings {
    /// Load settings from the default settings file
    ///
    /// Returns default settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
