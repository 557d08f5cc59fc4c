//! Command execution
//!
//! A [`CommandRunner`] turns one version's command template into the raw
//! response body. The coordinator calls it concurrently from every version
//! task of a scenario.

mod shell;

use std::time::Duration;

use async_trait::async_trait;

use crate::common::Result;

pub use shell::{normalize_command, render_command, ShellRunner, BASE_URL_PLACEHOLDER};

/// Budget used when a caller passes a zero timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes one version's command
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `template` against `base_url` and return the captured response
    ///
    /// Fails with [`crate::Error::CommandTimeout`] when `timeout` elapses and
    /// [`crate::Error::CommandFailed`] for anything else.
    async fn execute(
        &self,
        template: &str,
        version: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>>;
}
