//! Scenario matrix execution
//!
//! Loads a run matrix, executes every scenario against every version
//! concurrently and compares the responses of adjacent versions.

mod config;
mod coordinator;
mod deadline;
mod report;

pub use config::{MatrixConfig, Scenario, ValidationError, ValidationReport};
pub use coordinator::Coordinator;
pub use deadline::{CancelHandle, Deadline};
pub use report::{ExecutionOutcome, RunReport, RunStats, ScenarioReport, VersionDiff};
