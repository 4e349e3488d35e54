//! Spawning and supervising the llama-server child process.

use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::LlamaServerOptions;
use super::client::LlamaServerClient;
use crate::engine::EngineConfig;
use crate::error::LoadError;

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Value passed to `-ngl` when every layer should be offloaded.
const ALL_GPU_LAYERS: i32 = 999;

pub(super) fn gpu_layers_arg(n_gpu_layers: i32) -> String {
    if n_gpu_layers < 0 {
        ALL_GPU_LAYERS.to_string()
    } else {
        n_gpu_layers.to_string()
    }
}

pub(super) fn build_command(config: &EngineConfig, options: &LlamaServerOptions) -> Command {
    let mut cmd = Command::new(&options.binary);
    cmd.arg("-m")
        .arg(&config.model_path)
        .arg("--mmproj")
        .arg(&config.mmproj_path)
        .arg("-c")
        .arg(config.n_ctx.to_string())
        .arg("-ngl")
        .arg(gpu_layers_arg(config.n_gpu_layers))
        .arg("--host")
        .arg(&options.host)
        .arg("--port")
        .arg(options.port.to_string());

    for arg in &options.extra_args {
        cmd.arg(arg);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Forward the child's stdout/stderr into `tracing`, one line per event.
pub(super) fn forward_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader("stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader("stderr", stderr);
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(stream: &'static str, reader: R) {
    let spawned = std::thread::Builder::new()
        .name(format!("llama-server-{stream}"))
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                match line {
                    Ok(text) => debug!(target: "llama_server", stream, "{text}"),
                    Err(_) => break,
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, stream, "failed to spawn llama-server log reader");
    }
}

/// Fail if something already listens on the child's address; a stale server
/// there would otherwise answer the health probe in the child's place.
pub(super) fn ensure_port_free(host: &str, port: u16) -> Result<(), LoadError> {
    match TcpListener::bind((host, port)) {
        Ok(_) => Ok(()),
        Err(source) => Err(LoadError::PortInUse {
            addr: format!("{host}:{port}"),
            source,
        }),
    }
}

/// Poll `/health` until the model is loaded, the child dies, or `timeout`
/// elapses.
pub(super) fn wait_until_healthy(
    child: &mut Child,
    api: &LlamaServerClient,
    timeout: Duration,
) -> Result<(), LoadError> {
    info!(url = %api.base_url(), "waiting for llama-server to become healthy");
    let started = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Err(LoadError::ExitedDuringStartup { status }),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "failed to poll llama-server status"),
        }

        // A healthy answer only counts while our child is still running.
        if api.is_healthy() {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(LoadError::ExitedDuringStartup { status });
            }
            info!(
                elapsed_ms = started.elapsed().as_millis(),
                "llama-server is ready"
            );
            return Ok(());
        }

        if started.elapsed() >= timeout {
            return Err(LoadError::StartupTimeout {
                timeout_secs: timeout.as_secs(),
            });
        }

        std::thread::sleep(HEALTH_POLL_INTERVAL);
    }
}
