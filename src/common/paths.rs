//! Configuration and data paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/api-diff/` and `~/.local/share/api-diff/`
//! - macOS: `~/Library/Application Support/api-diff/`
//! - Windows: `%APPDATA%\api-diff\`

use std::path::PathBuf;

/// Name used for the application directories
const APP_NAME: &str = "api-diff";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the settings file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the default directory for stored responses
///
/// Falls back to `./responses` when no home directory can be determined.
pub fn default_storage_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("responses"))
        .unwrap_or_else(|| PathBuf::from("responses"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}
