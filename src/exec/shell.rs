//! Shell command runner
//!
//! Commands are usually pasted from browser devtools ("Copy as cURL"), so
//! line continuations and tabs are flattened before the base URL placeholder
//! is substituted and the result is handed to `sh -c`.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use super::{CommandRunner, DEFAULT_TIMEOUT};
use crate::common::{Error, Result};

/// Placeholder replaced by each version's base URL
pub const BASE_URL_PLACEHOLDER: &str = "{{BASE_URL}}";

/// Flatten a copied multi-line command into a single line
///
/// A trailing backslash on a line is a continuation even when spaces or
/// tabs follow it.
pub fn normalize_command(command: &str) -> String {
    command
        .lines()
        .map(|line| {
            let line = line.trim_end();
            line.strip_suffix('\\').unwrap_or(line)
        })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize `template` and substitute the base URL
pub fn render_command(template: &str, base_url: &str) -> String {
    normalize_command(template).replace(BASE_URL_PLACEHOLDER, base_url)
}

/// Runs commands through `sh -c`, capturing stdout as the response
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn execute(
        &self,
        template: &str,
        version: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };

        let command = render_command(template, base_url);
        if command.is_empty() {
            return Err(Error::CommandFailed("empty command".to_string()));
        }

        let program = command.split_whitespace().next().unwrap_or_default();
        if !matches!(program.to_lowercase().as_str(), "curl" | "curl.exe") {
            tracing::warn!(
                version,
                "command '{}' is not curl - execution may behave unexpectedly",
                program
            );
        }

        tracing::debug!(version, %command, "Executing command");

        let child = TokioCommand::new(&self.shell)
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandFailed(format!("failed to spawn command: {}", e)))?;

        let started = Instant::now();
        // Dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| Error::CommandFailed(format!("failed to wait for command: {}", e)))?,
            Err(_) => return Err(Error::CommandTimeout(timeout)),
        };

        tracing::debug!(
            version,
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %output.status,
            "Command finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::command_failed(
                &output.status.to_string(),
                stderr.trim(),
            ));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_devtools_copy() {
        let copied = "curl '{{BASE_URL}}/api/users' \\\n  -H 'Accept: application/json' \\\r\n\t--compressed";
        assert_eq!(
            normalize_command(copied),
            "curl '{{BASE_URL}}/api/users' -H 'Accept: application/json' --compressed"
        );
    }

    #[test]
    fn test_normalize_continuation_with_trailing_spaces() {
        let copied = "curl 'http://x/a' \\  \n  -H 'Accept: application/json' \\\t\r\n  --compressed";
        assert_eq!(
            normalize_command(copied),
            "curl 'http://x/a' -H 'Accept: application/json' --compressed"
        );
    }

    #[test]
    fn test_render_substitutes_every_placeholder() {
        assert_eq!(
            render_command("curl {{BASE_URL}}/a?next={{BASE_URL}}/b", "http://localhost:8080"),
            "curl http://localhost:8080/a?next=http://localhost:8080/b"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_captures_stdout() {
        let runner = ShellRunner::new();
        let body = runner
            .execute("printf '{{BASE_URL}}'", "v1", "hello", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, b"hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_continuation_adds_no_argument() {
        let body = ShellRunner::new()
            .execute("printf '%s|' a \\  \n b", "v1", "", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, b"a|b|");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_reports_exit_status_and_stderr() {
        let runner = ShellRunner::new();
        let err = runner
            .execute("echo boom >&2; exit 3", "v1", "", Duration::from_secs(5))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("execution failed:"), "{message}");
        assert!(message.contains("stderr: boom"), "{message}");
        assert!(!err.is_timeout());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_times_out() {
        let runner = ShellRunner::new();
        let started = Instant::now();
        let err = runner
            .execute("sleep 5", "v1", "", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_empty_command_fails() {
        let err = ShellRunner::new()
            .execute(" \\\n ", "v1", "", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "empty command");
    }
}
