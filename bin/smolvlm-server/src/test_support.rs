//! In-process engine and state fixtures for handler and router tests.

use std::sync::{Arc, Mutex};

use serde_json::json;
use smolvlm_engine::{
    ChatEngine, Completion, EngineContent, EngineError, EngineMessage, InferenceHandle,
    InferenceWorker,
};

use crate::config::Config;
use crate::state::AppState;

/// Arguments of one recorded engine call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<EngineMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
}

/// Answers with an OpenAI-shaped completion unless the first message's text
/// is one of the trigger strings.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedEngine {
    pub const REJECT: &'static str = "__reject__";
    pub const FAIL: &'static str = "__fail__";
}

impl ChatEngine for ScriptedEngine {
    fn chat_complete(
        &mut self,
        messages: &[EngineMessage],
        temperature: f32,
        max_tokens: i32,
    ) -> Result<Completion, EngineError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            temperature,
            max_tokens,
        });

        match messages.first().map(|m| &m.content) {
            Some(EngineContent::Text(t)) if t == Self::REJECT => {
                Err(EngineError::InvalidInput("image data is not valid base64".into()))
            }
            Some(EngineContent::Text(t)) if t == Self::FAIL => {
                Err(EngineError::Internal("failed to decode batch".into()))
            }
            _ => Ok(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "smolvlm-v1.8b-gguf",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "A cat on a sofa." },
                    "finish_reason": "stop",
                }],
                "usage": {
                    "prompt_tokens": 12,
                    "completion_tokens": max_tokens,
                    "total_tokens": 12 + max_tokens,
                },
            })),
        }
    }
}

pub async fn start_engine(engine: ScriptedEngine) -> InferenceHandle {
    InferenceWorker::start(move || Ok(engine), 4).await.unwrap()
}

/// Default configuration, untouched by the process environment.
pub fn test_config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

pub async fn ready_state(engine: ScriptedEngine) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), Some(start_engine(engine).await)))
}

pub fn loading_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), None))
}
