//! [`ChatEngine`] backed by a supervised llama.cpp `llama-server` process.
//!
//! The child is started with the model and multimodal projector, bound to
//! loopback, and reached over its OpenAI-compatible HTTP API.  It lives as
//! long as the [`LlamaServerEngine`] value and is killed on drop.

mod client;
mod process;

use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;

use tracing::{debug, info};

pub use client::LlamaServerClient;

use crate::engine::{ChatEngine, Completion, EngineConfig};
use crate::error::{EngineError, LoadError};
use crate::message::EngineMessage;

/// How to launch the llama-server child.
#[derive(Debug, Clone)]
pub struct LlamaServerOptions {
    /// Executable name or path (default: `llama-server` on `PATH`).
    pub binary: PathBuf,
    pub host: String,
    pub port: u16,
    /// Upper bound on model load time before giving up.
    pub startup_timeout: Duration,
    /// Appended verbatim after the generated arguments.
    pub extra_args: Vec<String>,
}

impl Default for LlamaServerOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("llama-server"),
            host: "127.0.0.1".to_owned(),
            port: 8081,
            startup_timeout: Duration::from_secs(300),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct LlamaServerEngine {
    child: Child,
    api: LlamaServerClient,
}

impl LlamaServerEngine {
    /// Verify the model files, spawn llama-server and block until it reports
    /// healthy.
    ///
    /// On any failure after the spawn the child is killed before returning.
    pub fn load(config: &EngineConfig, options: &LlamaServerOptions) -> Result<Self, LoadError> {
        config.verify_model_files()?;
        process::ensure_port_free(&options.host, options.port)?;

        let api = LlamaServerClient::new(format!("http://{}:{}", options.host, options.port))?;

        info!(
            binary = %options.binary.display(),
            model_path = %config.model_path.display(),
            mmproj_path = %config.mmproj_path.display(),
            n_ctx = config.n_ctx,
            n_gpu_layers = config.n_gpu_layers,
            "spawning llama-server"
        );
        let mut child = process::build_command(config, options)
            .spawn()
            .map_err(|source| LoadError::SpawnProcess {
                binary: options.binary.clone(),
                source,
            })?;
        process::forward_output(&mut child);

        let mut engine = Self { child, api };
        process::wait_until_healthy(&mut engine.child, &engine.api, options.startup_timeout)?;
        info!(pid = engine.child.id(), "llama-server loaded model");
        Ok(engine)
    }
}

impl ChatEngine for LlamaServerEngine {
    fn chat_complete(
        &mut self,
        messages: &[EngineMessage],
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError> {
        if let Ok(Some(status)) = self.child.try_wait() {
            return Err(EngineError::Internal(format!(
                "llama-server exited unexpectedly ({status})"
            )));
        }
        self.api.chat_completions(messages, temperature, max_tokens)
    }
}

impl Drop for LlamaServerEngine {
    fn drop(&mut self) {
        let pid = self.child.id();
        if let Err(e) = self.child.kill() {
            debug!(pid, error = %e, "llama-server already exited");
        }
        let _ = self.child.wait();
        info!(pid, "llama-server stopped");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_fails_fast_on_missing_model_without_spawning() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::new(
            dir.path().join("smolvlm.f16.gguf"),
            dir.path().join("mmproj-smolvlm.f16.gguf"),
            2048,
            -1,
        );
        let options = LlamaServerOptions {
            binary: PathBuf::from("/nonexistent/llama-server"),
            ..LlamaServerOptions::default()
        };

        let err = LlamaServerEngine::load(&config, &options).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { kind: "Model", .. }));
    }

    #[test]
    fn load_refuses_occupied_port_before_spawning() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("m.gguf");
        let mmproj = dir.path().join("p.gguf");
        std::fs::write(&model, b"gguf").unwrap();
        std::fs::write(&mmproj, b"gguf").unwrap();
        let stale = std::net::TcpListener::bind("127.0.0.1:0").unwrap();

        let config = EngineConfig::new(&model, &mmproj, 2048, -1);
        let options = LlamaServerOptions {
            binary: dir.path().join("no-such-llama-server"),
            port: stale.local_addr().unwrap().port(),
            ..LlamaServerOptions::default()
        };

        let err = LlamaServerEngine::load(&config, &options).unwrap_err();
        assert!(matches!(err, LoadError::PortInUse { .. }), "{err}");
    }

    #[test]
    fn load_reports_missing_binary() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("m.gguf");
        let mmproj = dir.path().join("p.gguf");
        std::fs::write(&model, b"gguf").unwrap();
        std::fs::write(&mmproj, b"gguf").unwrap();

        let free_port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let config = EngineConfig::new(&model, &mmproj, 2048, -1);
        let options = LlamaServerOptions {
            binary: dir.path().join("no-such-llama-server"),
            port: free_port,
            ..LlamaServerOptions::default()
        };

        let err = LlamaServerEngine::load(&config, &options).unwrap_err();
        assert!(matches!(err, LoadError::SpawnProcess { .. }), "{err}");
    }
}
