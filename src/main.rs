//! api-diff - compare API responses across versions
//!
//! Runs the same scenarios against several deployments of an API and shows
//! how the responses of adjacent versions differ.

use api_diff::common::config::Settings;
use api_diff::common::logging;
use api_diff::{cli, commands, Error};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "api-diff", about = "Compare API responses across versions")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: {e}; using default settings");
            Settings::default()
        }
    };

    // Flushes the execution log on drop
    let guard = logging::init_cli(&settings.logging);

    let result = cli::dispatch(cli.command, &settings).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let code = if matches!(e, Error::Cancelled { .. }) { 2 } else { 1 };
        drop(guard);
        std::process::exit(code);
    }
}
