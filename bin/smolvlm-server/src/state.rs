//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use smolvlm_engine::InferenceHandle;

use crate::config::Config;
use crate::error::ServerError;

/// State shared across all HTTP handlers.
///
/// The engine handle is decided once at startup and never reassigned: it is
/// `Some` exactly when the model loaded successfully.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    engine: Option<InferenceHandle>,
}

impl AppState {
    pub fn new(config: Config, engine: Option<InferenceHandle>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }

    /// Readiness gate.
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Result<&InferenceHandle, ServerError> {
        self.engine.as_ref().ok_or(ServerError::NotReady)
    }

    pub fn model_id(&self) -> &str {
        &self.config.model.model_id
    }
}
