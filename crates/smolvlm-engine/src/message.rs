//! Engine-facing chat messages.
//!
//! This is the flat shape the engine consumes, mirroring the OpenAI message
//! layout.  Optional fields are serialized only when present so that a part
//! carries exactly the keys the caller supplied.

use serde::Serialize;

/// One conversation turn handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineMessage {
    pub role: String,
    pub content: EngineContent,
}

impl EngineMessage {
    pub fn new(role: impl Into<String>, content: EngineContent) -> Self {
        Self {
            role: role.into(),
            content,
        }
    }
}

/// Either a plain string or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineContent {
    Text(String),
    Parts(Vec<EnginePart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnginePart {
    Text {
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        image_url: EngineImageUrl,
    },
}

/// Remote URL or `data:` URI; the engine decodes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineImageUrl {
    pub url: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_content_serializes_as_plain_string() {
        let msg = EngineMessage::new("user", EngineContent::Text("hello".into()));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "user", "content": "hello" })
        );
    }

    #[test]
    fn parts_keep_order_and_omit_unset_type() {
        let msg = EngineMessage::new(
            "user",
            EngineContent::Parts(vec![
                EnginePart::Text {
                    kind: None,
                    text: "describe".into(),
                },
                EnginePart::ImageUrl {
                    kind: Some("image_url".into()),
                    image_url: EngineImageUrl {
                        url: "data:image/png;base64,AAAA".into(),
                    },
                },
            ]),
        );

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "user",
                "content": [
                    { "text": "describe" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
                ]
            })
        );
    }
}
