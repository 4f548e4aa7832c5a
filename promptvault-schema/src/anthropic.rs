//! Anthropic Messages API schema (`POST /v1/messages`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::openai::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnthropicRequestBody {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    /// Required by the Messages API.
    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicResponseBody {
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicContentBlock {
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl AnthropicResponseBody {
    pub fn first_text(self) -> Option<String> {
        self.content.into_iter().next().and_then(|block| block.text)
    }
}
