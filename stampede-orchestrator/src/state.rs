use std::sync::Arc;

use crate::config::Config;
use crate::registry::JobRegistry;

/// Shared state handed to every handler via `State<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<JobRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
        }
    }
}
