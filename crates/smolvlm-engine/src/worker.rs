use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::engine::{ChatEngine, Completion};
use crate::error::{EngineError, LoadError};
use crate::message::EngineMessage;

// ── Internal channel protocol ─────────────────────────────────────────────────

enum WorkerCommand {
    ChatComplete {
        messages: Vec<EngineMessage>,
        temperature: f32,
        max_tokens: i32,
        reply_tx: oneshot::Sender<Result<Completion, EngineError>>,
    },
    /// Drop the engine, then acknowledge.
    Shutdown { done_tx: oneshot::Sender<()> },
}

// ── Inference worker ──────────────────────────────────────────────────────────

struct InferenceWorkerState<E> {
    engine: E,
    cmd_rx: mpsc::Receiver<WorkerCommand>,
}

impl<E: ChatEngine> InferenceWorkerState<E> {
    /// Breaks with the shutdown acknowledgement sender.
    fn handle_command(&mut self, cmd: WorkerCommand) -> ControlFlow<oneshot::Sender<()>> {
        match cmd {
            WorkerCommand::ChatComplete {
                messages,
                temperature,
                max_tokens,
                reply_tx,
            } => {
                let result = self.complete(&messages, temperature, max_tokens);
                if reply_tx.send(result).is_err() {
                    debug!("caller went away before the completion was delivered");
                }
                ControlFlow::Continue(())
            }
            WorkerCommand::Shutdown { done_tx } => ControlFlow::Break(done_tx),
        }
    }

    /// A panicking engine fails only the call that triggered it.
    fn complete(
        &mut self,
        messages: &[EngineMessage],
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError> {
        let engine = &mut self.engine;
        catch_unwind(AssertUnwindSafe(|| {
            engine.chat_complete(messages, temperature, max_tokens)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(error = %message, "engine panicked during completion");
            Err(EngineError::Internal(message))
        })
    }

    /// Serve commands until every [`InferenceHandle`] has been dropped or a
    /// shutdown is requested.
    fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            if let ControlFlow::Break(done_tx) = self.handle_command(cmd) {
                info!("inference worker shutting down");
                drop(self);
                let _ = done_tx.send(());
                return;
            }
        }
        info!("inference worker stopping");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "engine panicked".to_owned())
}

/// Owns the engine on a dedicated OS thread.
///
/// ```text
/// handler ──► cmd_tx ──► [vlm-inference thread] ──► engine.chat_complete
///    ▲                                                   │
///    └──────────────────── reply_tx ◄────────────────────┘
/// ```
///
/// The engine is constructed *on* that thread and never leaves it, so calls
/// are strictly serialized: one completion is in flight at a time and further
/// callers wait in the bounded queue.  There is no timeout and no
/// cancellation; a caller that goes away does not abort a running call.
pub struct InferenceWorker;

impl InferenceWorker {
    /// Spawn the worker thread, run `loader` on it and wait for the outcome.
    ///
    /// Returns a handle only if the engine loaded successfully.  The thread
    /// exits (dropping the engine) once every handle clone is gone.
    pub async fn start<E, F>(loader: F, queue_capacity: usize) -> Result<InferenceHandle, LoadError>
    where
        F: FnOnce() -> Result<E, LoadError> + Send + 'static,
        E: ChatEngine + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>(queue_capacity.max(1));
        let (load_tx, load_rx) = oneshot::channel::<Result<(), LoadError>>();

        std::thread::Builder::new()
            .name("vlm-inference".to_owned())
            .spawn(move || {
                let engine = match loader() {
                    Ok(engine) => engine,
                    Err(e) => {
                        let _ = load_tx.send(Err(e));
                        return;
                    }
                };
                if load_tx.send(Ok(())).is_err() {
                    return;
                }
                InferenceWorkerState { engine, cmd_rx }.run();
            })
            .map_err(|source| LoadError::SpawnWorker { source })?;

        load_rx.await.map_err(|_| LoadError::WorkerExited)??;
        Ok(InferenceHandle { cmd_tx })
    }
}

/// Cheap, cloneable access to the inference worker.
#[derive(Clone, Debug)]
pub struct InferenceHandle {
    cmd_tx: mpsc::Sender<WorkerCommand>,
}

impl InferenceHandle {
    pub async fn chat_complete(
        &self,
        messages: Vec<EngineMessage>,
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(WorkerCommand::ChatComplete {
                messages,
                temperature,
                max_tokens,
                reply_tx,
            })
            .await
            .map_err(|_| EngineError::WorkerShutdown)?;
        reply_rx.await.map_err(|_| EngineError::WorkerShutdown)?
    }

    /// Stop the worker and wait until the engine has been dropped.
    ///
    /// Requests queued ahead of the shutdown still complete; later calls on
    /// any clone fail with [`EngineError::WorkerShutdown`].
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(WorkerCommand::Shutdown { done_tx })
            .await
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }

    /// `false` once the worker thread has exited.
    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}
