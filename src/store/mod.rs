//! Response storage
//!
//! Successful responses are persisted so that pairs can be compared after
//! every version of a scenario has finished. Failed executions are recorded
//! too, for the execution history, but produce no locator.

mod file;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::Result;

pub use file::{sanitize_filename, CommandEntry, ExecutionRecord, FileStore, Index};

/// Opaque handle to a stored response
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentLocator(String);

impl ContentLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists raw responses and reads them back for comparison
///
/// Shared by all version tasks of a scenario; implementations synchronize
/// internally.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Persist a successful response
    async fn save(&self, command: &str, version: &str, body: &[u8]) -> Result<ContentLocator>;

    /// Record that `command` failed for `version`
    async fn record_failure(&self, command: &str, version: &str, error: &str) -> Result<()>;

    /// Read a stored response back
    async fn load(&self, locator: &ContentLocator) -> Result<Vec<u8>>;
}
