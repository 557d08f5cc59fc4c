//! CLI command definitions
//!
//! Defines the clap commands for the api-diff CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario matrix and compare adjacent versions
    Run {
        /// Matrix file (JSON, or YAML with a .yaml/.yml extension)
        config: PathBuf,

        /// Compare only JSON structure, ignoring values
        #[arg(long)]
        keys_only: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Per-command timeout in seconds (overrides the matrix file)
        #[arg(long)]
        timeout: Option<u64>,

        /// Stop starting new scenarios after this many seconds
        #[arg(long)]
        run_timeout: Option<u64>,

        /// Directory for stored responses
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },

    /// Compare two response files
    Compare {
        left: PathBuf,

        right: PathBuf,

        /// Compare only JSON structure, ignoring values
        #[arg(long)]
        keys_only: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a matrix file without running it
    Validate {
        config: PathBuf,
    },

    /// Delete stored responses
    Prune {
        /// Only delete responses older than this many hours
        #[arg(long, default_value = "0")]
        older_than_hours: u64,

        /// Directory for stored responses
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },
}
