use thiserror::Error as ThisError;

use crate::cipher::MIN_PBKDF2_ITERATIONS;

#[derive(Debug, ThisError)]
pub enum CipherError {
    /// Tag verification failed. Covers wrong passwords as well as truncated,
    /// mis-encoded or tampered blobs; no plaintext is ever produced.
    #[error("Authentication failed: wrong password or corrupted data")]
    Authentication,

    #[error("PBKDF2 iterations must be at least {min} (got {0})", min = MIN_PBKDF2_ITERATIONS)]
    IterationsTooLow(u32),

    #[error("Encryption failed")]
    Encryption,

    #[error("Cipher task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
