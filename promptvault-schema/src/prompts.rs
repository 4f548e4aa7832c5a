//! Remote prompts backend payloads (`/register`, `/login`, `/prompts`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body for `POST /prompts` and `PUT /prompts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptPayload {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemotePrompt {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// `{ "message": "..." }`, used by the backend for both errors and notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}
