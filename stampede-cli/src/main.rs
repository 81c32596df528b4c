//! Stampede CLI
//!
//! Submit load-test scripts to the orchestrator and follow their results.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "stampede")]
#[command(about = "Load-test job CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(
        long,
        env = "STAMPEDE_ORCHESTRATOR_URL",
        default_value = "http://localhost:3005"
    )]
    orchestrator_url: String,

    /// Milliseconds between status polls while watching
    #[arg(long, env = "STAMPEDE_POLL_INTERVAL_MS", default_value = "1000")]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.orchestrator_url,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    };

    handle_command(cli.command, &config).await
}
