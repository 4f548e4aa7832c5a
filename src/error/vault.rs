use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error as ThisError;

use super::{CipherError, ProviderError, StoreError};

/// Rejected before any cipher or store work is attempted.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),

    #[error("Endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, ThisError)]
pub enum VaultError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No saved connection named {0:?}")]
    NotFound(String),

    #[error("Authentication failed: wrong password or corrupted data")]
    Authentication,

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("{provider} API request timed out after {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    #[error("{provider} API error ({status}): {message}")]
    ProviderApi {
        provider: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error(transparent)]
    Provider(ProviderError),

    #[error(transparent)]
    Cipher(CipherError),
}

impl From<CipherError> for VaultError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Authentication => VaultError::Authentication,
            other => VaultError::Cipher(other),
        }
    }
}

impl From<ProviderError> for VaultError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout { provider, after } => VaultError::Timeout { provider, after },
            ProviderError::Api {
                provider,
                status,
                message,
            } => VaultError::ProviderApi {
                provider,
                status,
                message,
            },
            other => VaultError::Provider(other),
        }
    }
}

impl VaultError {
    /// Text suitable for showing to the user. None of these are fatal; the
    /// caller decides whether to offer another attempt.
    pub fn user_message(&self) -> String {
        match self {
            VaultError::Validation(err) => format!("Please check the form: {err}."),
            VaultError::NotFound(name) => {
                format!("No encrypted API key found for {name}. Please add it in settings.")
            }
            VaultError::Authentication => {
                "Failed to decrypt API key. Incorrect password or corrupted data.".to_string()
            }
            VaultError::Storage(_) => {
                "Local storage is unavailable. Your saved connections were not changed.".to_string()
            }
            VaultError::Timeout { provider, .. } => {
                format!("{provider} API request timed out.")
            }
            VaultError::ProviderApi {
                provider, message, ..
            } => format!("{provider} API error: {message}"),
            VaultError::Provider(err) => format!("Request failed: {err}"),
            VaultError::Cipher(err) => format!("Encryption failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_authentication_maps_to_vault_authentication() {
        let err = VaultError::from(CipherError::Authentication);
        assert!(matches!(err, VaultError::Authentication));
        assert!(err.user_message().contains("Incorrect password"));
    }

    #[test]
    fn provider_errors_keep_their_detail() {
        let err = VaultError::from(ProviderError::Api {
            provider: "Anthropic",
            status: StatusCode::UNAUTHORIZED,
            message: "invalid x-api-key".to_string(),
        });
        assert_eq!(err.user_message(), "Anthropic API error: invalid x-api-key");

        let err = VaultError::from(ProviderError::Timeout {
            provider: "OpenAI",
            after: Duration::from_secs(10),
        });
        assert!(matches!(err, VaultError::Timeout { .. }));
    }
}
