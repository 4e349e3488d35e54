//! OpenAI-compatible chat-completion route.
//!
//! Non-streaming only.  The body is inspected in stages so each failure gets
//! its own status: readiness, JSON syntax, the `stream` flag, the typed
//! schema, then the non-empty message list.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use smolvlm_engine::Completion;
use tracing::warn;
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::handlers::inference::invoke;
use crate::handlers::normalize::normalize;
use crate::schemas::v1::chat::{
    AssistantMessage, ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ContentPart, ImageUrl, ImageUrlPart, MessageContent, TextPart, Usage, lax_bool,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(chat_completions),
    components(schemas(
        ChatCompletionRequest,
        ChatMessage,
        MessageContent,
        ContentPart,
        TextPart,
        ImageUrlPart,
        ImageUrl,
        ChatCompletionResponse,
        ChatChoice,
        AssistantMessage,
        Usage
    ))
)]
pub struct ChatApi;

/// Register chat-completion routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat/completions", post(chat_completions))
}

/// OpenAI chat completions (`POST /v1/chat/completions`).
///
/// Returns the engine's completion object unchanged.  A `model` that differs
/// from the served model is logged and processed anyway.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "chat",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Completion generated", body = ChatCompletionResponse),
        (status = 400, description = "Streaming requested or input rejected by the engine"),
        (status = 422, description = "Request body does not match the schema"),
        (status = 500, description = "Inference failed"),
        (status = 503, description = "Model is not ready"),
    )
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Completion>, ServerError> {
    let engine = state.engine()?;

    let raw: Value = serde_json::from_slice(&body)?;
    if raw.get("stream").and_then(lax_bool) == Some(true) {
        return Err(ServerError::StreamingUnsupported);
    }

    let req: ChatCompletionRequest = serde_json::from_value(raw)?;
    req.validate()?;

    if req.model != state.model_id() {
        warn!(
            requested = %req.model,
            loaded = %state.model_id(),
            "request model does not match loaded model; processing anyway"
        );
    }

    let temperature = req.temperature();
    let max_tokens = req.max_tokens();
    let messages = normalize(req.messages);

    let completion = invoke(engine, &req.model, messages, temperature, max_tokens).await?;
    Ok(Json(completion))
}
