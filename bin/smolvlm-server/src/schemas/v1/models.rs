//! Response types for the model listing (`GET /v1/models`).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Owner reported for the served model.
pub const MODEL_OWNER: &str = "cloud-deployment";

/// A single entry in the model list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelCard {
    pub id: String,
    /// Always `"model"`.
    pub object: String,
    /// Unix timestamp taken when the card is built.
    pub created: i64,
    pub owned_by: String,
}

impl ModelCard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_owned(),
            created: Utc::now().timestamp(),
            owned_by: MODEL_OWNER.to_owned(),
        }
    }
}

/// Response body for `GET /v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelList {
    /// Always `"list"`.
    pub object: String,
    pub data: Vec<ModelCard>,
}

impl ModelList {
    pub fn new(data: Vec<ModelCard>) -> Self {
        Self {
            object: "list".to_owned(),
            data,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn card_carries_fixed_fields() {
        let before = Utc::now().timestamp();
        let card = ModelCard::new("smolvlm-v1.8b-gguf");

        assert_eq!(card.object, "model");
        assert_eq!(card.owned_by, "cloud-deployment");
        assert!(card.created >= before);
    }

    #[test]
    fn empty_list_serializes_with_list_object() {
        let body = serde_json::to_value(ModelList::new(Vec::new())).unwrap();
        assert_eq!(body, serde_json::json!({ "object": "list", "data": [] }));
    }
}
