//! CLI settings shared by every command

use stampede_client::OrchestratorClient;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the orchestrator
    pub orchestrator_url: String,

    /// Delay between status polls when watching a job
    pub poll_interval: Duration,
}

impl Config {
    pub fn client(&self) -> OrchestratorClient {
        OrchestratorClient::new(&self.orchestrator_url)
    }
}
