//! Vertex AI `:predict` schema for text models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VertexRequestBody {
    pub instances: Vec<VertexInstance>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VertexInstance {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexResponseBody {
    #[serde(default)]
    pub predictions: Vec<VertexPrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexPrediction {
    #[serde(default)]
    pub content: Option<String>,
}

impl VertexResponseBody {
    pub fn first_text(self) -> Option<String> {
        self.predictions
            .into_iter()
            .next()
            .and_then(|prediction| prediction.content)
    }
}
