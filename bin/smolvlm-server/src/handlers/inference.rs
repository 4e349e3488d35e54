//! Engine invocation with error classification.

use smolvlm_engine::{Completion, EngineMessage, InferenceHandle};
use tracing::info;

use crate::error::ServerError;

/// Run one completion on the engine.
///
/// No retries and no timeout: the call runs until the engine answers.
pub async fn invoke(
    engine: &InferenceHandle,
    model: &str,
    messages: Vec<EngineMessage>,
    temperature: f32,
    max_tokens: i32,
) -> Result<Completion, ServerError> {
    info!(model = %model, temperature, max_tokens, "generating completion");

    let completion = engine
        .chat_complete(messages, temperature, max_tokens)
        .await?;

    info!("successfully generated completion");
    Ok(completion)
}
