use reqwest::StatusCode;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RemoteError {
    #[error("Prompts backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Not logged in to the prompts backend")]
    Unauthenticated,

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}
