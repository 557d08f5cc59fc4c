//! Run reports
//!
//! Outcomes arrive in completion order; everything exposed here is ordered
//! by version label (outcomes, pairs) or by configuration order (scenarios).

use serde::Serialize;
use std::collections::BTreeMap;

use super::config::Scenario;
use crate::compare::DiffResult;
use crate::store::ContentLocator;

/// Result of running one version's command for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub version: String,
    /// Present iff the command succeeded and its response was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<ContentLocator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub timed_out: bool,
}

impl ExecutionOutcome {
    pub fn stored(version: impl Into<String>, locator: ContentLocator) -> Self {
        Self {
            version: version.into(),
            locator: Some(locator),
            error: None,
            timed_out: false,
        }
    }

    pub fn failed(version: impl Into<String>, error: impl Into<String>, timed_out: bool) -> Self {
        Self {
            version: version.into(),
            locator: None,
            error: Some(error.into()),
            timed_out,
        }
    }
}

/// Comparison of two adjacent versions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionDiff {
    pub version_a: String,
    pub version_b: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiffResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VersionDiff {
    pub fn compared(version_a: &str, version_b: &str, result: DiffResult) -> Self {
        Self {
            version_a: version_a.to_string(),
            version_b: version_b.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(version_a: &str, version_b: &str, error: impl Into<String>) -> Self {
        Self {
            version_a: version_a.to_string(),
            version_b: version_b.to_string(),
            result: None,
            error: Some(error.into()),
        }
    }

    /// Pair error naming every label without a stored response
    pub fn missing(version_a: &str, version_b: &str, missing: &[&str]) -> Self {
        Self::failed(
            version_a,
            version_b,
            format!(
                "failed to get responses for version(s): {}",
                missing.join(", ")
            ),
        )
    }
}

/// Everything produced for one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub commands: BTreeMap<String, String>,
    /// Sorted by version label
    pub outcomes: Vec<ExecutionOutcome>,
    /// One entry per adjacent pair of the run's sorted labels
    pub diffs: Vec<VersionDiff>,
}

impl ScenarioReport {
    /// Assemble a report from outcomes in completion order
    pub fn assemble(
        scenario: &Scenario,
        mut outcomes: Vec<ExecutionOutcome>,
        diffs: Vec<VersionDiff>,
    ) -> Self {
        outcomes.sort_by(|a, b| a.version.cmp(&b.version));
        Self {
            name: scenario.name.clone(),
            commands: scenario.commands.clone(),
            outcomes,
            diffs,
        }
    }

    pub fn outcome(&self, version: &str) -> Option<&ExecutionOutcome> {
        self.outcomes.iter().find(|o| o.version == version)
    }
}

/// Everything produced by a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// In configuration order
    pub scenarios: Vec<ScenarioReport>,
    /// Non-fatal warnings and errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Counts across a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub executions: usize,
    pub failed_executions: usize,
    pub timed_out: usize,
    pub pairs: usize,
    pub changed_pairs: usize,
    pub failed_pairs: usize,
}

impl RunReport {
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for scenario in &self.scenarios {
            for outcome in &scenario.outcomes {
                stats.executions += 1;
                if outcome.error.is_some() {
                    stats.failed_executions += 1;
                }
                if outcome.timed_out {
                    stats.timed_out += 1;
                }
            }
            for diff in &scenario.diffs {
                stats.pairs += 1;
                match &diff.result {
                    Some(result) if !result.is_identical() => stats.changed_pairs += 1,
                    Some(_) => {}
                    None => stats.failed_pairs += 1,
                }
            }
        }
        stats
    }
}
