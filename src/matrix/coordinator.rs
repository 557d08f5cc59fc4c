//! Execution coordinator
//!
//! Scenarios run one after another. Within a scenario every version gets its
//! own task; tasks report through an append-only queue and the coordinator
//! waits for all of them before comparing adjacent versions.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::FutureExt;
use tokio::sync::mpsc;

use super::config::Scenario;
use super::deadline::Deadline;
use super::report::{ExecutionOutcome, RunReport, ScenarioReport, VersionDiff};
use crate::common::logging::{EventLog, LogEntry};
use crate::common::{Error, Result};
use crate::compare::{compare, CompareMode};
use crate::exec::{CommandRunner, DEFAULT_TIMEOUT};
use crate::store::{ContentLocator, ResponseStore};

/// Runs a scenario matrix and compares the responses
pub struct Coordinator {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn ResponseStore>,
    events: Arc<dyn EventLog>,
    mode: CompareMode,
}

impl Coordinator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn ResponseStore>,
        events: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            runner,
            store,
            events,
            mode: CompareMode::Full,
        }
    }

    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run every scenario against every version
    ///
    /// `versions` maps version labels to base URLs. Per-version failures end
    /// up in the report. The only error is [`Error::Cancelled`], returned
    /// when `deadline` triggers before a scenario starts; it carries the
    /// scenarios completed so far.
    pub async fn run(
        &self,
        scenarios: &[Scenario],
        versions: &BTreeMap<String, String>,
        command_timeout: Duration,
        deadline: &Deadline,
    ) -> Result<RunReport> {
        let labels: Vec<&str> = versions.keys().map(String::as_str).collect();
        let timeout = if command_timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            command_timeout
        };

        let mut report = RunReport::default();

        for scenario in scenarios {
            if let Some(reason) = deadline.check() {
                tracing::warn!(
                    completed = report.scenarios.len(),
                    remaining = scenarios.len() - report.scenarios.len(),
                    "Run stopped: {}",
                    reason
                );
                report.errors.push(format!("operation cancelled: {}", reason));
                return Err(Error::Cancelled {
                    reason,
                    partial: Box::new(report),
                });
            }

            tracing::info!(scenario = %scenario.name, "Executing scenario");
            let scenario_report = self
                .run_scenario(scenario, versions, &labels, timeout, &mut report.errors)
                .await;
            report.scenarios.push(scenario_report);
        }

        Ok(report)
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        versions: &BTreeMap<String, String>,
        labels: &[&str],
        timeout: Duration,
        warnings: &mut Vec<String>,
    ) -> ScenarioReport {
        for version in scenario.commands.keys() {
            if !versions.contains_key(version) {
                let message = format!(
                    "Scenario '{}' has a command for unknown version '{}', ignoring",
                    scenario.name, version
                );
                tracing::warn!("{}", message);
                warnings.push(message);
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut launched = Vec::new();
        let mut handles = Vec::new();

        for (label, base_url) in versions {
            let Some(command) = scenario.commands.get(label) else {
                let message = format!(
                    "Scenario '{}' has no command for version '{}', skipping",
                    scenario.name, label
                );
                tracing::warn!("{}", message);
                warnings.push(message);
                continue;
            };

            let task = VersionTask {
                runner: Arc::clone(&self.runner),
                store: Arc::clone(&self.store),
                events: Arc::clone(&self.events),
                version: label.clone(),
                base_url: base_url.clone(),
                command: command.clone(),
                timeout,
            };
            let tx = tx.clone();
            launched.push(label.as_str());
            handles.push(tokio::spawn(async move {
                let outcome = task.run_isolated().await;
                // The receiver outlives every task
                let _ = tx.send(outcome);
            }));
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(handles.len());
        for (version, joined) in launched.iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                tracing::error!(version, "Version task did not complete: {}", e);
                outcomes.push(ExecutionOutcome::failed(
                    *version,
                    format!("task did not complete: {}", e),
                    false,
                ));
            }
        }
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        let diffs = self.compare_adjacent(labels, &outcomes).await;
        ScenarioReport::assemble(scenario, outcomes, diffs)
    }

    async fn compare_adjacent(
        &self,
        labels: &[&str],
        outcomes: &[ExecutionOutcome],
    ) -> Vec<VersionDiff> {
        let stored: HashMap<&str, &ContentLocator> = outcomes
            .iter()
            .filter_map(|o| o.locator.as_ref().map(|l| (o.version.as_str(), l)))
            .collect();

        let mut diffs = Vec::with_capacity(labels.len().saturating_sub(1));
        for pair in labels.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let diff = match (stored.get(a), stored.get(b)) {
                (Some(la), Some(lb)) => self.compare_stored(a, la, b, lb).await,
                (la, lb) => {
                    let mut missing = Vec::new();
                    if la.is_none() {
                        missing.push(a);
                    }
                    if lb.is_none() {
                        missing.push(b);
                    }
                    VersionDiff::missing(a, b, &missing)
                }
            };
            diffs.push(diff);
        }
        diffs
    }

    async fn compare_stored(
        &self,
        a: &str,
        locator_a: &ContentLocator,
        b: &str,
        locator_b: &ContentLocator,
    ) -> VersionDiff {
        let left = match self.store.load(locator_a).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return VersionDiff::failed(a, b, format!("failed to read response for {a}: {e}"))
            }
        };
        let right = match self.store.load(locator_b).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return VersionDiff::failed(a, b, format!("failed to read response for {b}: {e}"))
            }
        };

        // Zero bytes on both sides would otherwise read as identical
        for (label, body) in [(a, &left), (b, &right)] {
            if body.is_empty() {
                return VersionDiff::failed(a, b, format!("empty response content for {label}"));
            }
        }

        let result = compare(&left, &right, a, b, self.mode);
        tracing::debug!(version_a = a, version_b = b, summary = %result.summary, "Compared");
        VersionDiff::compared(a, b, result)
    }
}

/// Everything one version task needs, owned so it can move into a task
struct VersionTask {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn ResponseStore>,
    events: Arc<dyn EventLog>,
    version: String,
    base_url: String,
    command: String,
    timeout: Duration,
}

impl VersionTask {
    /// Run the task, turning a panic into a failed outcome
    async fn run_isolated(self) -> ExecutionOutcome {
        let events = Arc::clone(&self.events);
        let version = self.version.clone();
        let command = self.command.clone();

        match AssertUnwindSafe(self.run()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = format!("panic during execution: {}", panic_message(&*panic));
                events.record(
                    LogEntry::error(&version, "Panic recovered")
                        .command(&command)
                        .detail(message.clone()),
                );
                ExecutionOutcome::failed(version, message, false)
            }
        }
    }

    async fn run(self) -> ExecutionOutcome {
        let execution =
            self.runner
                .execute(&self.command, &self.version, &self.base_url, self.timeout);
        // Bound the call here too, so a runner that ignores its timeout cannot
        // hold up the scenario
        let result = match tokio::time::timeout(self.timeout, execution).await {
            Ok(result) => result,
            Err(_) => Err(Error::CommandTimeout(self.timeout)),
        };

        match result {
            Ok(body) => self.store_response(body).await,
            Err(e) => {
                let error = e.to_string();
                self.events.record(
                    LogEntry::error(&self.version, "Execution failed")
                        .command(&self.command)
                        .detail(error.clone()),
                );
                if let Err(store_err) = self
                    .store
                    .record_failure(&self.command, &self.version, &error)
                    .await
                {
                    self.events.record(
                        LogEntry::warn(&self.version, "Failed to record failure")
                            .command(&self.command)
                            .detail(store_err.to_string()),
                    );
                }
                ExecutionOutcome::failed(self.version, error, e.is_timeout())
            }
        }
    }

    async fn store_response(self, body: Vec<u8>) -> ExecutionOutcome {
        match self.store.save(&self.command, &self.version, &body).await {
            Ok(locator) => {
                self.events.record(
                    LogEntry::info(&self.version, "Response saved")
                        .command(&self.command)
                        .detail(locator.to_string()),
                );
                ExecutionOutcome::stored(self.version, locator)
            }
            Err(e) => {
                self.events.record(
                    LogEntry::error(&self.version, "Failed to save response")
                        .command(&self.command)
                        .detail(e.to_string()),
                );
                // Keep the body somewhere even though it could not be stored
                self.events.record(
                    LogEntry::error(&self.version, "Unsaved response body")
                        .command(&self.command)
                        .detail(String::from_utf8_lossy(&body).into_owned()),
                );
                ExecutionOutcome::failed(self.version, format!("save failed: {e}"), false)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
