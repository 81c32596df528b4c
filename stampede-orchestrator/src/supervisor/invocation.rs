//! Runner command line
//!
//! Built as an argument vector and executed without a shell, so script
//! environment values travel verbatim.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

use crate::config::Config;

/// Program and arguments for one runner execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl RunnerInvocation {
    /// `<runner_command> run -e K=V ... --out json=<results>/<id>-output.json <scripts>/<id>.js`
    pub fn build(config: &Config, id: Uuid, env: &BTreeMap<String, String>) -> Self {
        let mut parts = config.runner_command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();

        let mut args: Vec<String> = parts.collect();
        args.push("run".to_string());
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push("--out".to_string());
        args.push(format!(
            "json={}/{}",
            config.runner_results_path.trim_end_matches('/'),
            output_file_name(id)
        ));
        args.push(format!(
            "{}/{}",
            config.runner_scripts_path.trim_end_matches('/'),
            script_file_name(id)
        ));

        Self { program, args }
    }

    /// Human-readable form, recorded on the job
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

pub fn script_file_name(id: Uuid) -> String {
    format!("{id}.js")
}

pub fn output_file_name(id: Uuid) -> String {
    format!("{id}-output.json")
}

/// Where the orchestrator writes the script for `id`
pub fn script_path(scripts_dir: &Path, id: Uuid) -> PathBuf {
    scripts_dir.join(script_file_name(id))
}

/// Where the orchestrator reads the runner's structured output for `id`
pub fn output_path(results_dir: &Path, id: Uuid) -> PathBuf {
    results_dir.join(output_file_name(id))
}
