//! smolvlm-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON records when `LOG_JSON` is set).
//! 3. Load the model on the inference worker thread.  A failed load is
//!    logged and the server starts anyway, reporting not-ready.
//! 4. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod schemas;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use smolvlm_engine::{InferenceWorker, LlamaServerEngine};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env()?;

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: LOG_LEVEL='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "smolvlm-server starting");

    // ── 3. Model ───────────────────────────────────────────────────────────────
    let model = &cfg.model;
    info!(
        model_path = %model.model_path.display(),
        mmproj_path = %model.mmproj_path.display(),
        n_gpu_layers = model.n_gpu_layers,
        n_ctx = model.n_ctx,
        "starting model loading"
    );

    let engine_cfg = model.engine_config();
    let options = cfg.llama_server_options();
    let engine = match InferenceWorker::start(
        move || LlamaServerEngine::load(&engine_cfg, &options),
        cfg.inference_queue_capacity,
    )
    .await
    {
        Ok(handle) => {
            info!(model = %model.model_id, "model loaded successfully");
            Some(handle)
        }
        Err(e) => {
            error!(error = %e, "failed to load model; serving in not-ready state");
            None
        }
    };

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let state = Arc::new(AppState::new(cfg, engine));
    let app = routes::build(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the engine child process before the runtime goes away.
    if let Ok(engine) = state.engine() {
        engine.shutdown().await;
    }

    info!("smolvlm-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
