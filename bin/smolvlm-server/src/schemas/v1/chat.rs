//! OpenAI-compatible chat-completion request / response types.
//!
//! Message content is either a plain string or an ordered list of typed
//! parts.  Both unions are resolved at parse time so handlers never inspect
//! raw JSON.  Content parts remember whether the caller sent `type`, which
//! lets the normalizer forward only the keys that were actually supplied.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: i32 = 500;

// ── Request ──────────────────────────────────────────────────────────────────

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ChatCompletionRequest {
    /// Requested model id.  A mismatch with the served model is logged but
    /// not rejected.
    pub model: String,
    /// Conversation turns in order.
    #[validate(length(min = 1, message = "messages must contain at least one message"))]
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (default 0.7).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate (default 500); negative means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
    /// Must be falsy; streaming is rejected.  Accepts the usual boolean
    /// spellings (`1`, `"true"`, `"no"`, ...).
    #[serde(
        default,
        deserialize_with = "deserialize_lax_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> i32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Interpret a JSON value as a boolean the way lenient form parsers do.
///
/// Returns `None` for values with no boolean reading.
pub fn lax_bool(value: &serde_json::Value) -> Option<bool> {
    use serde_json::Value;
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" | "t" => Some(true),
            "false" | "0" | "no" | "n" | "off" | "f" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn deserialize_lax_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => lax_bool(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a boolean, got {value}"))),
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// The role of the message author (`"system"`, `"user"`, `"assistant"`).
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MessageContentVisitor)
    }
}

struct MessageContentVisitor;

impl<'de> Visitor<'de> for MessageContentVisitor {
    type Value = MessageContent;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or an array of content parts")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MessageContent::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MessageContent::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut parts = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(part) = seq.next_element::<ContentPart>()? {
            parts.push(part);
        }
        Ok(MessageContent::Parts(parts))
    }
}

/// One unit of multimodal content.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ContentPart {
    Text(TextPart),
    ImageUrl(ImageUrlPart),
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TextPart {
    /// `"text"` when supplied.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImageUrlPart {
    /// `"image_url"` when supplied.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub image_url: ImageUrl,
}

/// Remote URL or `data:image/...;base64,...` URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImageUrl {
    pub url: String,
}

/// Wire shape before the text / image_url decision.
#[derive(Deserialize)]
struct RawContentPart {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

impl TryFrom<RawContentPart> for ContentPart {
    type Error = String;

    /// An explicit `type` selects the variant; without one the variant is
    /// inferred from the fields, text first.
    fn try_from(raw: RawContentPart) -> Result<Self, Self::Error> {
        let RawContentPart {
            kind,
            text,
            image_url,
        } = raw;
        match kind.as_deref() {
            Some("text") => text
                .map(|text| ContentPart::Text(TextPart { kind, text }))
                .ok_or_else(|| "content part of type `text` is missing field `text`".to_owned()),
            Some("image_url") => image_url
                .map(|image_url| ContentPart::ImageUrl(ImageUrlPart { kind, image_url }))
                .ok_or_else(|| {
                    "content part of type `image_url` is missing field `image_url`".to_owned()
                }),
            Some(other) => Err(format!(
                "unsupported content part type `{other}` (expected `text` or `image_url`)"
            )),
            None => match (text, image_url) {
                (Some(text), _) => Ok(ContentPart::Text(TextPart { kind: None, text })),
                (None, Some(image_url)) => {
                    Ok(ContentPart::ImageUrl(ImageUrlPart { kind: None, image_url }))
                }
                (None, None) => {
                    Err("content part must carry either `text` or `image_url`".to_owned())
                }
            },
        }
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawContentPart::deserialize(deserializer)?
            .try_into()
            .map_err(de::Error::custom)
    }
}

// ── Response (documentation shape) ───────────────────────────────────────────
//
// The handler returns the engine's completion object verbatim; these types
// describe it for OpenAPI and for tests.

/// Response body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionResponse {
    pub id: String,
    /// Always `"chat.completion"`.
    pub object: String,
    /// Unix timestamp of when the response was created.
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    /// Why generation stopped (`"stop"`, `"length"`, …).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssistantMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ChatCompletionRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn defaults_apply_when_fields_absent_or_null() {
        let req = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": "hi" }],
            "temperature": null,
        }))
        .unwrap();

        assert_eq!(req.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(req.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(req.stream, None);
    }

    #[test]
    fn string_content_parses_as_text() {
        let req = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": "What is in this image?" }],
        }))
        .unwrap();

        assert_eq!(
            req.messages[0].content,
            MessageContent::Text("What is in this image?".into())
        );
    }

    #[test]
    fn parts_keep_order_and_presence_of_type() {
        let req = parse(json!({
            "model": "m",
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "a" },
                    { "image_url": { "url": "data:image/png;base64,AAAA", "detail": "low" } },
                ],
            }],
        }))
        .unwrap();

        let MessageContent::Parts(parts) = &req.messages[0].content else {
            panic!("expected parts");
        };
        assert_eq!(
            parts,
            &vec![
                ContentPart::Text(TextPart {
                    kind: Some("text".into()),
                    text: "a".into(),
                }),
                ContentPart::ImageUrl(ImageUrlPart {
                    kind: None,
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".into(),
                    },
                }),
            ]
        );
    }

    #[test]
    fn stream_accepts_boolean_spellings() {
        for (raw, expected) in [
            (json!(1), Some(true)),
            (json!("true"), Some(true)),
            (json!("off"), Some(false)),
            (json!(0), Some(false)),
        ] {
            let req = parse(json!({
                "model": "m",
                "messages": [{ "role": "user", "content": "hi" }],
                "stream": raw,
            }))
            .unwrap();
            assert_eq!(req.stream, expected, "{raw}");
        }

        let err = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": "hi" }],
            "stream": "maybe",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("expected a boolean"), "{err}");
    }

    #[test]
    fn negative_max_tokens_is_accepted() {
        let req = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": "hi" }],
            "max_tokens": -1,
        }))
        .unwrap();
        assert_eq!(req.max_tokens(), -1);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let req = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": "x", "name": "bob" }],
            "top_p": 0.9,
            "user": "abc",
        }));
        assert!(req.is_ok());
    }

    #[test]
    fn text_part_without_text_is_rejected() {
        let err = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": [{ "type": "text" }] }],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field `text`"), "{err}");
    }

    #[test]
    fn image_part_without_nested_url_is_rejected() {
        let err = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": [{ "type": "image_url", "image_url": {} }] }],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field `url`"), "{err}");
    }

    #[test]
    fn unknown_part_type_is_rejected() {
        let err = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": [{ "type": "audio", "text": "x" }] }],
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unsupported content part type `audio`"), "{err}");
    }

    #[test]
    fn non_string_non_array_content_is_rejected() {
        let err = parse(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": 42 }],
        }))
        .unwrap_err();
        assert!(
            err.to_string().contains("a string or an array of content parts"),
            "{err}"
        );
    }

    #[test]
    fn missing_model_is_rejected() {
        let err = parse(json!({ "messages": [] })).unwrap_err();
        assert!(err.to_string().contains("missing field `model`"), "{err}");
    }

    #[test]
    fn empty_messages_fail_validation() {
        let req = parse(json!({ "model": "m", "messages": [] })).unwrap();
        let err = req.validate().unwrap_err();
        assert!(
            err.to_string().contains("messages must contain at least one message"),
            "{err}"
        );
    }
}
