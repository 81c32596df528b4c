//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;
pub mod template;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/api/k6-test/run", post(job::run_test))
        .route("/api/k6-test/status/{id}", get(job::get_status))
        // Template endpoints
        .route("/api/k6-test/templates", get(template::list_templates))
        .route("/api/k6-test/templates/{name}", get(template::get_template))
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
