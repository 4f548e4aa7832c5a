use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    Actor(String),

    #[error("Failed to open record store: {0}")]
    Open(String),

    #[error("Migration to schema version {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },
}
