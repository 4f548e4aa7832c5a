pub mod cipher;
pub mod config;
pub mod error;
pub mod providers;
pub mod remote;
pub mod store;
pub mod utils;
pub mod vault;

pub use error::{CipherError, ProviderError, RemoteError, StoreError, ValidationError, VaultError};
pub use vault::{Outcome, PasswordPrompt, Vault};
