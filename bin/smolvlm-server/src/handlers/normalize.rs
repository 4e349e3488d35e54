//! Request messages → engine messages.
//!
//! A pure structural transform: string content passes through unchanged,
//! part lists keep their order, and a part's `type` key is forwarded only
//! when the caller sent it.

use smolvlm_engine::{EngineContent, EngineImageUrl, EngineMessage, EnginePart};

use crate::schemas::v1::chat::{ChatMessage, ContentPart, MessageContent};

pub fn normalize(messages: Vec<ChatMessage>) -> Vec<EngineMessage> {
    messages.into_iter().map(normalize_message).collect()
}

fn normalize_message(message: ChatMessage) -> EngineMessage {
    let content = match message.content {
        MessageContent::Text(text) => EngineContent::Text(text),
        MessageContent::Parts(parts) => {
            EngineContent::Parts(parts.into_iter().map(normalize_part).collect())
        }
    };
    EngineMessage::new(message.role, content)
}

fn normalize_part(part: ContentPart) -> EnginePart {
    match part {
        ContentPart::Text(p) => EnginePart::Text {
            kind: p.kind,
            text: p.text,
        },
        ContentPart::ImageUrl(p) => EnginePart::ImageUrl {
            kind: p.kind,
            image_url: EngineImageUrl {
                url: p.image_url.url,
            },
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn messages(value: serde_json::Value) -> Vec<ChatMessage> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn string_content_passes_through() {
        let out = normalize(messages(json!([{ "role": "user", "content": "hello" }])));

        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{ "role": "user", "content": "hello" }])
        );
    }

    #[test]
    fn parts_keep_order_and_only_set_fields() {
        let out = normalize(messages(json!([{
            "role": "user",
            "content": [
                { "type": "text", "text": "a" },
                { "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,/9j/" } },
            ],
        }])));

        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{
                "role": "user",
                "content": [
                    { "type": "text", "text": "a" },
                    { "type": "image_url", "image_url": { "url": "data:image/jpeg;base64,/9j/" } },
                ],
            }])
        );
    }

    #[test]
    fn omitted_type_stays_omitted() {
        let out = normalize(messages(json!([{
            "role": "user",
            "content": [
                { "image_url": { "url": "https://example.com/cat.png" } },
                { "text": "describe" },
            ],
        }])));

        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{
                "role": "user",
                "content": [
                    { "image_url": { "url": "https://example.com/cat.png" } },
                    { "text": "describe" },
                ],
            }])
        );
    }

    #[test]
    fn message_order_is_preserved() {
        let out = normalize(messages(json!([
            { "role": "system", "content": "be brief" },
            { "role": "user", "content": "one" },
            { "role": "assistant", "content": "two" },
        ])));

        let roles: Vec<&str> = out.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
    }
}
