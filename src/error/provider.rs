use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum ProviderError {
    /// The configured bound elapsed before a full response arrived.
    #[error("{provider} API request timed out after {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    /// Non-2xx upstream answer; `message` is the provider's own text when it sent one.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: StatusCode,
        message: String,
    },

    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} returned an unexpected response: {detail}")]
    InvalidResponse {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} requires a model to be specified")]
    MissingModel { provider: &'static str },

    #[error("{provider} requires an endpoint")]
    MissingEndpoint { provider: &'static str },

    #[error("{provider} rejected the credential as a header value")]
    InvalidCredential { provider: &'static str },

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl IsRetryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
