use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One saved provider credential. `encrypted_key` is always a cipher blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct ConnectionRecord {
    /// User-chosen label; the record's identity.
    pub friendly_name: String,
    pub service_type: String,
    pub encrypted_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct LocalDraftRecord {
    /// Assigned by the store on first insert; never reused.
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Only meaningful once the draft is published to the prompts backend.
    pub is_public: bool,
}

/// A draft that has not been assigned an id yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewDraft {
    pub title: String,
    pub content: String,
    pub is_public: bool,
}

impl NewDraft {
    pub fn with_id(self, id: i64) -> LocalDraftRecord {
        LocalDraftRecord {
            id,
            title: self.title,
            content: self.content,
            is_public: self.is_public,
        }
    }
}
