//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod template;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a script for execution
    Submit {
        /// Path to the load-test script
        script: PathBuf,

        /// Script environment as KEY=value pairs (e.g., -e VUS=10 -e DURATION=30)
        #[arg(short, long = "env", value_parser = job::parse_key_val)]
        env: Vec<(String, String)>,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the current status of a job
    Status {
        /// Job ID
        id: String,
    },
    /// Poll a job until it completes or fails
    Watch {
        /// Job ID
        id: String,

        /// Poll interval in milliseconds (overrides --poll-interval-ms)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List starter scripts, or print one
    Templates {
        /// Template name
        name: Option<String>,

        /// Write the template to this file instead of printing it
        #[arg(short, long, requires = "name")]
        output: Option<PathBuf>,
    },
}

/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit { script, env, watch } => {
            job::submit(config, &script, env, watch).await
        }
        Commands::Status { id } => job::status(config, &id).await,
        Commands::Watch { id, interval } => {
            let interval = interval.map_or(config.poll_interval, Duration::from_millis);
            job::watch(config, &id, interval).await
        }
        Commands::Templates { name, output } => match name {
            Some(name) => template::show(config, &name, output.as_deref()).await,
            None => template::list(config).await,
        },
    }
}
