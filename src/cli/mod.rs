//! CLI command handling
//!
//! Dispatches CLI commands to the run engine and formats output.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Settings;
use crate::common::logging::TracingEventLog;
use crate::common::{Error, Result};
use crate::compare::{compare, CompareMode, DiffResult};
use crate::exec::ShellRunner;
use crate::matrix::{Coordinator, Deadline, MatrixConfig, RunReport, ScenarioReport};
use crate::store::FileStore;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Run {
            config,
            keys_only,
            json,
            timeout,
            run_timeout,
            storage_dir,
        } => {
            let matrix = MatrixConfig::load(&config)?;

            let mode = CompareMode::from_keys_only(keys_only || matrix.keys_only);
            let command_timeout = timeout
                .map(Duration::from_secs)
                .or_else(|| matrix.timeout())
                .unwrap_or_else(|| settings.timeouts.command());
            let run_budget = run_timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| settings.timeouts.run());
            let deadline = Deadline::after(run_budget);
            let storage_dir = storage_dir_or_default(storage_dir, settings);

            let scenarios = matrix.scenarios();
            tracing::info!(
                scenarios = scenarios.len(),
                versions = matrix.versions.len(),
                storage = %storage_dir.display(),
                "Starting run"
            );

            let coordinator = Coordinator::new(
                Arc::new(ShellRunner::new()),
                Arc::new(FileStore::open(storage_dir)),
                Arc::new(TracingEventLog),
            )
            .with_mode(mode);

            let (deadline, cancel) = deadline.cancellable();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!(
                        "{}",
                        "Interrupted, finishing the current scenario...".yellow()
                    );
                    cancel.cancel();
                }
            });

            let result = coordinator
                .run(&scenarios, &matrix.versions, command_timeout, &deadline)
                .await;
            interrupt.abort();

            match &result {
                Ok(report) => print_run_report(report, json)?,
                Err(e) => {
                    if let Some(partial) = e.partial_report() {
                        print_run_report(partial, json)?;
                    }
                }
            }
            result.map(|_| ())
        }

        Commands::Compare {
            left,
            right,
            keys_only,
            json,
        } => {
            let left_bytes = read_response(&left).await?;
            let right_bytes = read_response(&right).await?;

            let result = compare(
                &left_bytes,
                &right_bytes,
                &label(&left),
                &label(&right),
                CompareMode::from_keys_only(keys_only),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_diff(&result);
            }
            Ok(())
        }

        Commands::Validate { config } => {
            let matrix = MatrixConfig::read(&config)?;
            let report = matrix.validate();

            for warning in &report.warnings {
                println!("{} {}", "warning:".yellow(), warning);
            }
            if report.is_valid() {
                println!(
                    "{} {} ({} versions, {} scenarios)",
                    "✓".green(),
                    config.display(),
                    matrix.versions.len(),
                    matrix.scenarios().len()
                );
                Ok(())
            } else {
                for error in &report.errors {
                    println!("{} {}", "error:".red(), error);
                }
                Err(Error::Validation(report.to_string()))
            }
        }

        Commands::Prune {
            older_than_hours,
            storage_dir,
        } => {
            let storage_dir = storage_dir_or_default(storage_dir, settings);
            if !storage_dir.exists() {
                println!("Nothing to prune: {} does not exist", storage_dir.display());
                return Ok(());
            }

            let store = FileStore::open(storage_dir);
            let removed = store.prune(hours(older_than_hours)).await?;
            println!(
                "Removed {} response file(s) from {}",
                removed,
                store.base_dir().display()
            );
            Ok(())
        }
    }
}

/// Duration of `n` hours, saturating at the largest representable duration
fn hours(n: u64) -> Duration {
    n.checked_mul(3600)
        .map(Duration::from_secs)
        .unwrap_or(Duration::MAX)
}

/// Storage directory from the command line, falling back to settings
fn storage_dir_or_default(dir: Option<PathBuf>, settings: &Settings) -> PathBuf {
    dir.unwrap_or_else(|| settings.storage.dir.clone())
}

async fn read_response(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::file_read(path, e))
}

/// Diff header label for a file
fn label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_run_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for scenario in &report.scenarios {
        print_scenario(scenario);
    }

    if !report.errors.is_empty() {
        println!("\n{}", "Warnings:".yellow());
        for error in &report.errors {
            println!("  {}", error);
        }
    }

    let stats = report.stats();
    println!(
        "\n{} scenario(s), {} execution(s) ({} failed, {} timed out), {} pair(s) ({} changed, {} failed)",
        report.scenarios.len(),
        stats.executions,
        stats.failed_executions,
        stats.timed_out,
        stats.pairs,
        stats.changed_pairs,
        stats.failed_pairs
    );
    Ok(())
}

fn print_scenario(scenario: &ScenarioReport) {
    println!("\n{}", format!("=== {} ===", scenario.name).cyan().bold());

    for outcome in &scenario.outcomes {
        match (&outcome.locator, &outcome.error) {
            (Some(locator), _) => {
                println!("  {} {} {}", "✓".green(), outcome.version, locator.as_str().dimmed())
            }
            (None, Some(error)) if outcome.timed_out => {
                println!("  {} {} timed out: {}", "✗".red(), outcome.version, error)
            }
            (None, error) => println!(
                "  {} {} {}",
                "✗".red(),
                outcome.version,
                error.as_deref().unwrap_or("failed")
            ),
        }
    }

    for diff in &scenario.diffs {
        println!(
            "\n{}",
            format!("{} → {}", diff.version_a, diff.version_b).bold()
        );
        match (&diff.result, &diff.error) {
            (Some(result), _) => print_diff(result),
            (None, error) => println!("  {}", error.as_deref().unwrap_or("not compared").red()),
        }
    }
}

fn print_diff(result: &DiffResult) {
    if result.is_identical() {
        println!("{} {}", "No significant differences.".green(), result.summary.dimmed());
        return;
    }

    println!("{}", result.summary.yellow());
    for line in result.text_diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{}", line);
        }
    }
}
