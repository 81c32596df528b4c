//! Job API Handlers
//!
//! Submission and polling of load-test jobs.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use stampede_core::dto::job::{JobStatusResponse, StatusView, SubmitJob, SubmitJobResponse};

use crate::api::error::ApiResult;
use crate::service::job_service;
use crate::state::AppState;

/// POST /api/k6-test/run
/// Store the script and start the runner in the background
pub async fn run_test(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJob>, JsonRejection>,
) -> ApiResult<Json<SubmitJobResponse>> {
    let Json(req) = payload.inspect_err(|rejection| {
        tracing::debug!("Rejected submission: {}", rejection.body_text());
    })?;

    let job_id = job_service::submit(&state, req).await?;

    Ok(Json(SubmitJobResponse {
        job_id,
        status: StatusView::Submitted,
    }))
}

/// GET /api/k6-test/status/{id}
/// Unknown ids answer `not_found` rather than an HTTP error
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<JobStatusResponse> {
    tracing::debug!("Getting status: {}", id);
    Json(job_service::get_status(&state.registry, &id))
}
