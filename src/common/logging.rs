//! Logging and tracing configuration
//!
//! Human-readable logs go to stderr. When a log file is configured, the same
//! events are also written as JSON lines through a non-blocking appender so
//! that a run leaves an execution log behind.
//!
//! The coordinator never talks to the subscriber directly: it records
//! [`LogEntry`] values through an injected [`EventLog`].

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::{LogRotation, LoggingConfig};

/// Target used for events recorded through [`TracingEventLog`]
pub const EVENTS_TARGET: &str = "api_diff::events";

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
///
/// The returned guard flushes the execution log on drop; keep it alive for
/// the duration of `main`.
pub fn init_cli(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("api_diff=info,warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let appender = logging
        .file
        .as_deref()
        .and_then(|path| open_appender(path, logging.rotation));

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_current_span(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn open_appender(path: &Path, rotation: LogRotation) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path.file_name()?;

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Could not create log directory {}: {}", dir.display(), e);
        return None;
    }

    let rotation = match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    };

    match RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            None
        }
    }
}

/// Severity of a recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One execution event: which version, which command, what happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub version: String,
    pub command: Option<String>,
    pub message: String,
    pub detail: Option<String>,
}

impl LogEntry {
    fn new(level: LogLevel, version: &str, message: &str) -> Self {
        Self {
            level,
            version: version.to_string(),
            command: None,
            message: message.to_string(),
            detail: None,
        }
    }

    pub fn info(version: &str, message: &str) -> Self {
        Self::new(LogLevel::Info, version, message)
    }

    pub fn warn(version: &str, message: &str) -> Self {
        Self::new(LogLevel::Warn, version, message)
    }

    pub fn error(version: &str, message: &str) -> Self {
        Self::new(LogLevel::Error, version, message)
    }

    pub fn command(mut self, command: &str) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Sink for execution events
///
/// Called concurrently from every version task of a scenario, so
/// implementations must be thread-safe. Recording never fails and must not
/// block for long.
pub trait EventLog: Send + Sync {
    fn record(&self, entry: LogEntry);
}

/// Default [`EventLog`] that forwards entries to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&self, entry: LogEntry) {
        let command = entry.command.as_deref().unwrap_or_default();
        let detail = entry.detail.as_deref().unwrap_or_default();
        match entry.level {
            LogLevel::Info => tracing::info!(
                target: EVENTS_TARGET,
                version = %entry.version,
                command,
                detail,
                "{}",
                entry.message
            ),
            LogLevel::Warn => tracing::warn!(
                target: EVENTS_TARGET,
                version = %entry.version,
                command,
                detail,
                "{}",
                entry.message
            ),
            LogLevel::Error => tracing::error!(
                target: EVENTS_TARGET,
                version = %entry.version,
                command,
                detail,
                "{}",
                entry.message
            ),
        }
    }
}
