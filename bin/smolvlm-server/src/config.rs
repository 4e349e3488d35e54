//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use smolvlm_engine::{EngineConfig, LlamaServerOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected} (got {value:?})")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// The model being served.  Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    /// Multimodal projector weights.
    pub mmproj_path: PathBuf,
    /// Negative offloads every layer.
    pub n_gpu_layers: i32,
    pub n_ctx: u32,
    /// Identifier advertised by `/v1/models` and compared against requests.
    pub model_id: String,
}

impl ModelConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            &self.model_path,
            &self.mmproj_path,
            self.n_ctx,
            self.n_gpu_layers,
        )
    }
}

/// Runtime configuration for smolvlm-server.
///
/// Every field has a default so the server starts without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated CORS allow-list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// Request body cap; inline base64 images make bodies large.
    pub max_body_bytes: usize,

    pub model: ModelConfig,

    /// llama-server executable.
    pub llama_server_bin: PathBuf,

    /// Loopback port the llama-server child listens on.
    pub llama_server_port: u16,

    pub engine_startup_timeout_secs: u64,

    /// Inference requests allowed to wait behind the running one before
    /// further callers block on the queue.
    pub inference_queue_capacity: usize,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Ok(Self {
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0:8000"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_json: parse_flag(lookup("LOG_JSON"), false),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS").filter(|v| !v.trim().is_empty()),
            enable_swagger: parse_flag(lookup("ENABLE_SWAGGER"), true),
            max_body_bytes: parse_env(&lookup, "MAX_BODY_BYTES", 32 * 1024 * 1024, "byte count")?,
            model: ModelConfig {
                model_path: env_or("MODEL_PATH", "/models/smolvlm.f16.gguf").into(),
                mmproj_path: env_or("MMPROJ_PATH", "/models/mmproj-smolvlm.f16.gguf").into(),
                n_gpu_layers: parse_env(&lookup, "N_GPU_LAYERS", -1, "integer")?,
                n_ctx: parse_env(&lookup, "N_CTX", 2048, "positive integer")?,
                model_id: env_or("MODEL_ID", "smolvlm-v1.8b-gguf"),
            },
            llama_server_bin: env_or("LLAMA_SERVER_BIN", "llama-server").into(),
            llama_server_port: parse_env(&lookup, "LLAMA_SERVER_PORT", 8081, "port number")?,
            engine_startup_timeout_secs: parse_env(
                &lookup,
                "ENGINE_STARTUP_TIMEOUT_SECS",
                300,
                "number of seconds",
            )?,
            inference_queue_capacity: parse_env(
                &lookup,
                "INFERENCE_QUEUE_CAPACITY",
                16,
                "positive integer",
            )?,
        })
    }

    pub fn llama_server_options(&self) -> LlamaServerOptions {
        LlamaServerOptions {
            binary: self.llama_server_bin.clone(),
            port: self.llama_server_port,
            startup_timeout: Duration::from_secs(self.engine_startup_timeout_secs),
            ..LlamaServerOptions::default()
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value,
            expected,
        }),
    }
}
