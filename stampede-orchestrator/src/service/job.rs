//! Job Service
//!
//! Submission and status lookup for load-test jobs.

use stampede_core::domain::job::Job;
use stampede_core::dto::job::{JobStatusResponse, SubmitJob};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::registry::{JobRegistry, RegistryError};
use crate::state::AppState;
use crate::supervisor::Supervisor;
use crate::supervisor::invocation::{self, RunnerInvocation};

/// Service error type
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to write script {}: {source}", path.display())]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Writes the script, registers the job and starts supervising it
///
/// Returns as soon as the job is registered; the run itself proceeds on
/// its own task.
pub async fn submit(state: &AppState, req: SubmitJob) -> Result<Uuid, SubmitError> {
    let config = &state.config;
    let id = state.registry.reserve_id();

    let script_path = invocation::script_path(&config.scripts_dir, id);
    tokio::fs::write(&script_path, req.script.as_bytes())
        .await
        .map_err(|source| SubmitError::ScriptWrite {
            path: script_path.clone(),
            source,
        })?;

    let invocation = RunnerInvocation::build(config, id, &req.env);
    let job = Job::new(
        id,
        script_path,
        invocation::output_path(&config.results_dir, id),
        invocation.display(),
    );
    let shared = state.registry.insert(job)?;

    tracing::info!(
        "Job submitted: {} ({} env var(s), {} job(s) tracked)",
        id,
        req.env.len(),
        state.registry.len()
    );

    Supervisor::new(shared, invocation, config).spawn();
    Ok(id)
}

/// Current snapshot of a job, or `not_found` for unknown and malformed ids
pub fn get_status(registry: &JobRegistry, job_id: &str) -> JobStatusResponse {
    match Uuid::parse_str(job_id).ok().and_then(|id| registry.snapshot(id)) {
        Some(job) => job.into(),
        None => JobStatusResponse::not_found(job_id),
    }
}
