//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Engine failures are reported with the engine's own message; the full
//! error is also logged server-side.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use smolvlm_engine::EngineError;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the smolvlm-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body does not match the chat-completion schema.
    #[error("{0}")]
    Schema(String),

    /// The engine failed to load at startup.
    #[error("Model is not ready. Please try again shortly.")]
    NotReady,

    #[error("Streaming generation is not supported.")]
    StreamingUnsupported,

    /// The engine rejected the input.
    #[error("Invalid request data or model processing error: {0}")]
    InvalidInput(String),

    /// Any other inference failure.
    #[error("Internal server error during inference: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::StreamingUnsupported | ServerError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::NotReady => {
                error!("chat completion request received, but model is not ready");
            }
            ServerError::InvalidInput(m) => {
                error!(error = %m, "engine rejected inference input");
            }
            ServerError::Internal(m) => {
                error!(error = %m, "unexpected error during inference");
            }
            ServerError::Schema(_) | ServerError::StreamingUnsupported => {}
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidInput(m) => ServerError::InvalidInput(m),
            EngineError::Internal(m) => ServerError::Internal(m),
            other @ EngineError::WorkerShutdown => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::Schema(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServerError::Schema(e.to_string())
    }
}
