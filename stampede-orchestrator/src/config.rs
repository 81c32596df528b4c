//! Orchestrator configuration
//!
//! Defines where scripts and results live, how the load-test runner is
//! invoked, and the limits applied to requests and captured output.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Runner exit code meaning "finished, but thresholds were crossed"
pub const DEFAULT_THRESHOLD_EXIT_CODE: i32 = 99;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Directory receiving one `<job id>.js` file per submission
    pub scripts_dir: PathBuf,

    /// Directory the runner writes `<job id>-output.json` files into
    pub results_dir: PathBuf,

    /// Program (and leading arguments) that starts the runner,
    /// e.g. `docker-compose exec -T k6 k6`. Split on whitespace.
    pub runner_command: String,

    /// `scripts_dir` as seen by the runner (a container mount point)
    pub runner_scripts_path: String,

    /// `results_dir` as seen by the runner
    pub runner_results_path: String,

    /// Exit code treated as a completed run with a threshold warning
    pub threshold_exit_code: i32,

    /// Most recent runner output retained per job, in bytes
    pub max_output_bytes: usize,

    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - ORCHESTRATOR_BIND_ADDR (default: 0.0.0.0:3005)
    /// - SCRIPTS_DIR (default: k6-scripts)
    /// - RESULTS_DIR (default: results)
    /// - RUNNER_COMMAND (default: "docker-compose exec -T k6 k6")
    /// - RUNNER_SCRIPTS_PATH (default: /scripts)
    /// - RUNNER_RESULTS_PATH (default: /results)
    /// - THRESHOLD_EXIT_CODE (default: 99)
    /// - MAX_OUTPUT_BYTES (default: 8 MiB)
    /// - MAX_BODY_BYTES (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: env_or("ORCHESTRATOR_BIND_ADDR", defaults.bind_addr),
            scripts_dir: std::env::var("SCRIPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scripts_dir),
            results_dir: std::env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            runner_command: env_or("RUNNER_COMMAND", defaults.runner_command),
            runner_scripts_path: env_or("RUNNER_SCRIPTS_PATH", defaults.runner_scripts_path),
            runner_results_path: env_or("RUNNER_RESULTS_PATH", defaults.runner_results_path),
            threshold_exit_code: parsed_env("THRESHOLD_EXIT_CODE")
                .unwrap_or(defaults.threshold_exit_code),
            max_output_bytes: parsed_env("MAX_OUTPUT_BYTES").unwrap_or(defaults.max_output_bytes),
            max_body_bytes: parsed_env("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("bind_addr '{}' is not a socket address", self.bind_addr);
        }

        if self.runner_command.split_whitespace().next().is_none() {
            anyhow::bail!("runner_command cannot be empty");
        }

        if self.runner_scripts_path.is_empty() || self.runner_results_path.is_empty() {
            anyhow::bail!("runner paths cannot be empty");
        }

        if self.threshold_exit_code == 0 {
            anyhow::bail!("threshold_exit_code must differ from the success code 0");
        }

        if self.max_output_bytes == 0 {
            anyhow::bail!("max_output_bytes must be greater than 0");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        Ok(())
    }

    /// Creates the scripts and results directories if absent
    pub async fn prepare_directories(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.scripts_dir).await?;
        tokio::fs::create_dir_all(&self.results_dir).await?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3005".to_string(),
            scripts_dir: PathBuf::from("k6-scripts"),
            results_dir: PathBuf::from("results"),
            runner_command: "docker-compose exec -T k6 k6".to_string(),
            runner_scripts_path: "/scripts".to_string(),
            runner_results_path: "/results".to_string(),
            threshold_exit_code: DEFAULT_THRESHOLD_EXIT_CODE,
            max_output_bytes: 8 * 1024 * 1024,
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}
