//! Inference engine boundary for the SmolVLM gateway.
//!
//! The HTTP layer never touches an engine directly.  It holds an
//! [`InferenceHandle`] obtained from [`InferenceWorker::start`], which owns
//! the engine on a dedicated OS thread and serves one completion at a time.
//!
//! ```rust,no_run
//! use smolvlm_engine::{
//!     EngineConfig, EngineContent, EngineMessage, InferenceWorker, LlamaServerEngine,
//!     LlamaServerOptions,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::new("/models/smolvlm.f16.gguf", "/models/mmproj-smolvlm.f16.gguf", 2048, -1);
//! let options = LlamaServerOptions::default();
//! let handle = InferenceWorker::start(move || LlamaServerEngine::load(&config, &options), 16).await?;
//!
//! let completion = handle
//!     .chat_complete(
//!         vec![EngineMessage::new("user", EngineContent::Text("Hello".into()))],
//!         0.7,
//!         500,
//!     )
//!     .await?;
//! println!("{completion}");
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod llama_server;
mod message;
mod worker;

pub use engine::{ChatEngine, Completion, EngineConfig};
pub use error::{EngineError, LoadError};
pub use llama_server::{LlamaServerClient, LlamaServerEngine, LlamaServerOptions};
pub use message::{EngineContent, EngineImageUrl, EngineMessage, EnginePart};
pub use worker::{InferenceHandle, InferenceWorker};
