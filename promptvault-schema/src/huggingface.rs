//! Hugging Face Inference API text-generation schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `{ "inputs": "...", "parameters": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HuggingFaceRequestBody {
    pub inputs: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub parameters: BTreeMap<String, Value>,
}

/// The inference endpoint answers with an array of generations.
pub type HuggingFaceResponseBody = Vec<HuggingFaceGeneration>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceGeneration {
    pub generated_text: String,
}
