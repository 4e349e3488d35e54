//! Liveness and root status endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::schemas::status::{HealthStatus, RootStatus};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health, get_root), components(schemas(HealthStatus, RootStatus)))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/", get(get_root))
}

/// Heartbeat endpoint.
///
/// Always 200; `model_ready` mirrors whether the engine loaded.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthStatus)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus::new(state.is_ready()))
}

/// API root.  Reports `"loading"` until the model is ready.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service status", body = RootStatus)
    )
)]
pub async fn get_root(State(state): State<Arc<AppState>>) -> Json<RootStatus> {
    Json(RootStatus::for_model(state.model_id(), state.is_ready()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
