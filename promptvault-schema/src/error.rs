//! Provider error envelopes.
//!
//! Most vendors answer failures with `{ "error": { "message": "..." } }`;
//! Hugging Face uses `{ "error": "..." }`. Both shapes land here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub error: Option<UpstreamErrorField>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamErrorField {
    Text(String),
    Object(UpstreamErrorObject),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamErrorObject {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl UpstreamErrorBody {
    /// The provider's own message, when the envelope carries one.
    pub fn message(&self) -> Option<&str> {
        match self.error.as_ref()? {
            UpstreamErrorField::Text(text) => Some(text.as_str()),
            UpstreamErrorField::Object(obj) => obj.message.as_deref(),
        }
    }
}
