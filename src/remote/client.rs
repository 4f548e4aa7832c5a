use promptvault_schema::{LoginRequest, LoginResponse, MessageBody, PromptPayload, RemotePrompt};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use zeroize::Zeroizing;

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::providers::UPSTREAM_BODY_PREVIEW_CHARS;
use crate::store::LocalDraftRecord;

impl From<&LocalDraftRecord> for PromptPayload {
    fn from(draft: &LocalDraftRecord) -> Self {
        Self {
            title: draft.title.clone(),
            content: draft.content.clone(),
            is_public: draft.is_public,
        }
    }
}

/// REST client for the prompts backend.
///
/// Routes are appended to the base URL's path, so a backend mounted under a
/// prefix (`http://host/api`) is reached at `http://host/api/prompts`.
///
/// Holds the bearer token from [`PromptsClient::login`]; calls that need it
/// fail with [`RemoteError::Unauthenticated`] before any request is sent.
pub struct PromptsClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<Zeroizing<String>>,
}

impl PromptsClient {
    pub fn new(base_url: Url) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(cfg: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(cfg.base_url.clone())
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Reuse a token obtained earlier.
    pub fn with_token(mut self, token: Zeroizing<String>) -> Self {
        self.token = Some(token);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), RemoteError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .request(Method::POST, "register", false)?
            .json(&body)
            .send()
            .await?;
        let _: MessageBody = read_json(resp).await?;
        info!(username, "Registered with prompts backend");
        Ok(())
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), RemoteError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .request(Method::POST, "login", false)?
            .json(&body)
            .send()
            .await?;
        let LoginResponse { token } = read_json(resp).await?;
        self.token = Some(Zeroizing::new(token));
        info!(username, "Logged in to prompts backend");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<RemotePrompt>, RemoteError> {
        let resp = self.request(Method::GET, "prompts", true)?.send().await?;
        read_json(resp).await
    }

    pub async fn get(&self, id: i64) -> Result<RemotePrompt, RemoteError> {
        let resp = self
            .request(Method::GET, &format!("prompts/{id}"), true)?
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn create(&self, payload: &PromptPayload) -> Result<RemotePrompt, RemoteError> {
        let resp = self
            .request(Method::POST, "prompts", true)?
            .json(payload)
            .send()
            .await?;
        let created: RemotePrompt = read_json(resp).await?;
        debug!(prompt_id = created.id, "Prompt created remotely");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: &PromptPayload,
    ) -> Result<RemotePrompt, RemoteError> {
        let resp = self
            .request(Method::PUT, &format!("prompts/{id}"), true)?
            .json(payload)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let resp = self
            .request(Method::DELETE, &format!("prompts/{id}"), true)?
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        debug!(prompt_id = id, "Prompt deleted remotely");
        Ok(())
    }

    /// Public prompts of every user. No login needed.
    pub async fn list_public(&self) -> Result<Vec<RemotePrompt>, RemoteError> {
        let resp = self
            .request(Method::GET, "prompts/public", false)?
            .send()
            .await?;
        read_json(resp).await
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
    ) -> Result<RequestBuilder, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(path.split('/'));
        let builder = self.client.request(method, url);
        if !authenticated {
            return Ok(builder);
        }
        let token = self.token.as_ref().ok_or(RemoteError::Unauthenticated)?;
        Ok(builder.bearer_auth(token.as_str()))
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, RemoteError> {
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

/// Non-2xx answer to [`RemoteError::Status`], preferring the backend's
/// `{ "message": ... }` text.
async fn status_error(resp: reqwest::Response) -> RemoteError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();

    let message = serde_json::from_slice::<MessageBody>(&bytes)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            let raw_body = String::from_utf8_lossy(&bytes);
            if raw_body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            } else {
                format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS)
            }
        });

    debug!(%status, %message, "Prompts backend returned an error");
    RemoteError::Status { status, message }
}
