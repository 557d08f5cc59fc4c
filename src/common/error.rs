//! Error types for api-diff
//!
//! Per-version failures (command, timeout, storage) are normally folded into
//! the run report rather than returned. Only cancellation and setup problems
//! surface as the coordinator's own error.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::matrix::RunReport;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for api-diff
#[derive(Error, Debug)]
pub enum Error {
    // === Command Errors ===
    #[error("{0}")]
    CommandFailed(String),

    #[error("timeout after {0:?}")]
    CommandTimeout(Duration),

    // === Storage Errors ===
    #[error("{0}")]
    Storage(String),

    #[error("Response '{0}' not found in store")]
    ResponseNotFound(String),

    // === Run Errors ===
    #[error("operation cancelled: {reason}")]
    Cancelled {
        reason: String,
        partial: Box<RunReport>,
    },

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("config validation failed: {0}")]
    Validation(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a command failure from a message and captured stderr
    pub fn command_failed(message: &str, stderr: &str) -> Self {
        if stderr.is_empty() {
            Self::CommandFailed(format!("execution failed: {message}"))
        } else {
            Self::CommandFailed(format!("execution failed: {message} | stderr: {stderr}"))
        }
    }

    /// Create a storage error with context
    pub fn storage(context: &str, error: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {error}"))
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error is a command deadline overrun
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout(_))
    }

    /// The partial report carried by a cancelled run
    pub fn partial_report(&self) -> Option<&RunReport> {
        match self {
            Self::Cancelled { partial, .. } => Some(partial.as_ref()),
            _ => None,
        }
    }
}
