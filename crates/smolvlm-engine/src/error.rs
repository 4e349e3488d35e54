use std::path::PathBuf;

use thiserror::Error;

/// Failures while bringing the engine up.
///
/// Any of these leaves the gateway permanently not-ready; there is no retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{kind} file not found at {}. Contents of {}: {listing}", path.display(), dir.display())]
    FileNotFound {
        kind: &'static str,
        path: PathBuf,
        dir: PathBuf,
        listing: String,
    },

    #[error("Failed to spawn engine process `{}`", binary.display())]
    SpawnProcess {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine port {addr} is already in use")]
    PortInUse {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine process exited during startup ({status})")]
    ExitedDuringStartup { status: std::process::ExitStatus },

    #[error("Engine did not become healthy within {timeout_secs}s")]
    StartupTimeout { timeout_secs: u64 },

    #[error("Failed to build engine HTTP client")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to spawn inference worker thread")]
    SpawnWorker {
        #[source]
        source: std::io::Error,
    },

    #[error("Inference worker exited before reporting a load result")]
    WorkerExited,
}

/// Failures of a single `chat_complete` call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine rejected the messages or generation parameters.
    #[error("{0}")]
    InvalidInput(String),

    /// Anything else: resource exhaustion, decode faults, transport errors.
    #[error("{0}")]
    Internal(String),

    #[error("Inference worker shut down unexpectedly")]
    WorkerShutdown,
}

impl EngineError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, EngineError::InvalidInput(_))
    }
}
