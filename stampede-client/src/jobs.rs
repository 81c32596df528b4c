//! Job-related API endpoints

use crate::OrchestratorClient;
use crate::error::{ClientError, Result};
use stampede_core::dto::job::{JobStatusResponse, StatusView, SubmitJob, SubmitJobResponse};
use std::time::Duration;

impl OrchestratorClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a script for execution
    ///
    /// Returns as soon as the orchestrator has registered the job.
    pub async fn submit_job(&self, req: SubmitJob) -> Result<SubmitJobResponse> {
        let url = format!("{}/api/k6-test/run", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Current snapshot of a job
    ///
    /// Unknown ids come back as a snapshot with status `not_found`.
    pub async fn get_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let url = format!("{}/api/k6-test/status/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Poll a job until it completes or fails
    ///
    /// `on_update` sees every snapshot, including the final one.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        interval: Duration,
        mut on_update: impl FnMut(&JobStatusResponse),
    ) -> Result<JobStatusResponse> {
        loop {
            let snapshot = self.get_status(job_id).await?;
            on_update(&snapshot);

            match snapshot.status {
                StatusView::NotFound => return Err(ClientError::JobNotFound(job_id.to_string())),
                status if status.is_terminal() => return Ok(snapshot),
                _ => {
                    tracing::debug!("Job {} is {}, polling again", job_id, snapshot.status);
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}
