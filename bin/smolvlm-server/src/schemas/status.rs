//! Liveness / readiness response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body for `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Always `"healthy"` while the process is up.
    pub status: String,
    pub model_ready: bool,
}

/// Response body for `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RootStatus {
    /// `"ready"` when the model is loaded, `"loading"` otherwise.
    pub status: String,
    pub message: String,
}

impl RootStatus {
    pub fn for_model(model_id: &str, ready: bool) -> Self {
        if ready {
            Self {
                status: "ready".to_owned(),
                message: format!("SmolVLM API ({model_id}) is running"),
            }
        } else {
            Self {
                status: "loading".to_owned(),
                message: format!("SmolVLM API ({model_id}) is initializing..."),
            }
        }
    }
}

impl HealthStatus {
    pub fn new(model_ready: bool) -> Self {
        Self {
            status: "healthy".to_owned(),
            model_ready,
        }
    }
}
