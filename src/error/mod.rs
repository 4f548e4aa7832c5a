mod cipher;
mod provider;
mod remote;
mod store;
mod vault;

pub use cipher::CipherError;
pub use provider::ProviderError;
pub use remote::RemoteError;
pub use store::StoreError;
pub use vault::{ValidationError, VaultError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
