//! API diff - run the same requests against several API versions and
//! compare the responses
//!
//! The library exposes the run engine ([`matrix::Coordinator`]), the
//! comparison engine ([`compare::compare`]) and the pluggable execution and
//! storage backends used by the CLI.

pub mod cli;
pub mod commands;
pub mod common;
pub mod compare;
pub mod exec;
pub mod matrix;
pub mod store;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use compare::{compare, CompareMode, DiffResult};
pub use matrix::{Coordinator, Deadline, MatrixConfig, RunReport, Scenario};
