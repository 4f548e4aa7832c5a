use serde::{Deserialize, Serialize};

/// `GET /v1/models` payload. Only `id` is required; the other fields vary
/// between OpenAI and compatible routers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenaiModelList {
    #[serde(default = "default_list_object")]
    pub object: String,
    pub data: Vec<OpenaiModel>,
}

impl Default for OpenaiModelList {
    fn default() -> Self {
        Self {
            object: default_list_object(),
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenaiModel {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

impl OpenaiModelList {
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_iter().map(|model| model.id).collect()
    }
}

fn default_list_object() -> String {
    "list".to_string()
}
