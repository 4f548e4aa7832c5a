//! OpenAI-compatible Chat Completions request schema.
//!
//! Also spoken by the Requesty router, which fronts many vendors behind the
//! same `/v1/chat/completions` shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request body for `POST /v1/chat/completions`.
///
/// `extra` carries caller-supplied parameters verbatim, so new upstream knobs
/// can be used without a schema change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenaiChatRequestBody {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_fields_are_flattened_into_the_body() {
        let mut extra = BTreeMap::new();
        extra.insert("presence_penalty".to_string(), json!(0.5));

        let body = OpenaiChatRequestBody {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            extra,
        };

        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["presence_penalty"], json!(0.5));
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("max_tokens").is_none());
    }
}
