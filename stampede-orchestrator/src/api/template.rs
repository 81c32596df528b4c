//! Template API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use stampede_core::dto::template::TemplateResponse;
use std::collections::BTreeMap;

use crate::api::error::ApiResult;
use crate::service::template_service;
use crate::state::AppState;

/// GET /api/k6-test/templates
pub async fn list_templates(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(template_service::list_templates(&state.config.scripts_dir).await)
}

/// GET /api/k6-test/templates/{name}
pub async fn get_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<TemplateResponse>> {
    let content = template_service::get_template(&state.config.scripts_dir, &name).await?;
    Ok(Json(TemplateResponse { name, content }))
}
