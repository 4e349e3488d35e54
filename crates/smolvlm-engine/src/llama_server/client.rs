//! Blocking HTTP client for a llama-server child.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::debug;

use crate::engine::Completion;
use crate::error::{EngineError, LoadError};
use crate::message::EngineMessage;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    messages: &'a [EngineMessage],
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

/// Talks to the OpenAI-compatible endpoints of a running llama-server.
///
/// Inference requests carry no timeout: generation runs until the engine
/// finishes or fails.
#[derive(Debug, Clone)]
pub struct LlamaServerClient {
    http: Client,
    base_url: String,
}

impl LlamaServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
        let http = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|source| LoadError::HttpClient { source })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `true` once the model is loaded; llama-server answers 503 while loading.
    pub fn is_healthy(&self) -> bool {
        match self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "health probe failed");
                false
            }
        }
    }

    pub fn chat_completions(
        &self,
        messages: &[EngineMessage],
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError> {
        let body = ChatCompletionBody {
            messages,
            temperature,
            max_tokens,
            stream: false,
        };
        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| EngineError::Internal(format!("engine request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| EngineError::Internal(format!("failed to read engine response: {e}")))?;
        classify_response(status, &text)
    }
}

/// 2xx → completion object; 4xx → invalid input; everything else → internal.
fn classify_response(status: StatusCode, body: &str) -> Result<Completion, EngineError> {
    if status.is_success() {
        return match serde_json::from_str::<Completion>(body) {
            Ok(completion) if completion.is_object() => Ok(completion),
            Ok(_) => Err(EngineError::Internal(
                "engine returned a non-object completion".to_owned(),
            )),
            Err(e) => Err(EngineError::Internal(format!(
                "engine returned malformed JSON: {e}"
            ))),
        };
    }

    let message = error_message(body).unwrap_or_else(|| format!("engine responded with {status}"));
    if status.is_client_error() {
        Err(EngineError::InvalidInput(message))
    } else {
        Err(EngineError::Internal(message))
    }
}

/// Pull the human-readable message out of an OpenAI-style error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_owned());
    };
    let error = value.get("error").unwrap_or(&value);
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_owned)
        .or_else(|| Some(trimmed.to_owned()))
}
