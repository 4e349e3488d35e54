//! Model listing route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;
use utoipa::OpenApi;

use crate::schemas::v1::models::{ModelCard, ModelList};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_models), components(schemas(ModelList, ModelCard)))]
pub struct ModelsApi;

/// Register model-listing routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

/// List the served model (`GET /v1/models`).
///
/// Returns an empty list while the model is not ready.
#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "v1::models",
    responses(
        (status = 200, description = "Served models", body = ModelList),
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    if !state.is_ready() {
        warn!("`/v1/models` called but model is not ready");
        return Json(ModelList::new(Vec::new()));
    }
    Json(ModelList::new(vec![ModelCard::new(state.model_id())]))
}
