//! The vault orchestrator.
//!
//! The only place a plaintext API key exists in memory. A key is decrypted
//! for exactly one adapter call or one re-seal, then dropped (and wiped) when
//! that operation returns, whatever the result.

mod prompt;
mod state;
mod validate;

pub use prompt::{PasswordPrompt, PasswordPurpose, PasswordRequest, ScriptedPrompt};
pub use state::{CredentialState, Outcome};

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::cipher::{self, CipherParams};
use crate::config::Config;
use crate::error::{ValidationError, VaultError};
use crate::providers::{GenerationConfig, LlmAdapter, ProviderHttp, ServiceType};
use crate::store::{
    ConnectionRecord, LazyStore, LocalDraftRecord, NewDraft, StoreHandle, StoreOptions,
};
use state::CredentialTracker;
use validate::{check_target, required};

/// A connection as entered by the user, before sealing.
pub struct NewConnection {
    pub friendly_name: String,
    pub service_type: String,
    pub api_key: Zeroizing<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

impl fmt::Debug for NewConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewConnection")
            .field("friendly_name", &self.friendly_name)
            .field("service_type", &self.service_type)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// What callers may see of a saved connection. Never includes the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub friendly_name: String,
    pub service_type: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

impl From<ConnectionRecord> for ConnectionSummary {
    fn from(record: ConnectionRecord) -> Self {
        Self {
            friendly_name: record.friendly_name,
            service_type: record.service_type,
            endpoint: record.endpoint,
            model: record.model,
        }
    }
}

#[derive(Clone)]
pub struct Vault {
    store: LazyStore,
    http: ProviderHttp,
    cipher: CipherParams,
}

impl Vault {
    pub fn new(store: LazyStore, http: ProviderHttp, cipher: CipherParams) -> Self {
        Self {
            store,
            http,
            cipher,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, VaultError> {
        let store = LazyStore::new(StoreOptions::new(cfg.basic.database_url.clone()));
        let http = ProviderHttp::new(&cfg.providers)?;
        let cipher = CipherParams::new(cfg.cipher.pbkdf2_iterations)?;
        Ok(Self::new(store, http, cipher))
    }

    async fn store(&self) -> Result<&StoreHandle, VaultError> {
        Ok(self.store.get().await?)
    }

    pub async fn close(&self) -> Result<(), VaultError> {
        Ok(self.store.close().await?)
    }

    /// Seal `api_key` under `password` and upsert the record by name.
    ///
    /// Every field is checked before the cipher or the store is touched.
    pub async fn save_connection(
        &self,
        connection: NewConnection,
        password: &str,
    ) -> Result<(), VaultError> {
        let friendly_name = required("friendly_name", &connection.friendly_name)?.to_string();
        let target = check_target(
            &connection.service_type,
            connection.endpoint.as_deref(),
            connection.model.as_deref(),
        )?;
        if connection.api_key.trim().is_empty() {
            return Err(ValidationError::MissingField("api_key").into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let encrypted_key = cipher::encrypt(&connection.api_key, password, self.cipher).await?;
        drop(connection.api_key);

        let record = ConnectionRecord {
            friendly_name,
            service_type: target.service_type.as_str().to_string(),
            encrypted_key,
            endpoint: target.endpoint,
            model: target.model,
        };

        info!(
            friendly_name = %record.friendly_name,
            service_type = %record.service_type,
            "Saving connection"
        );
        self.store().await?.upsert_connection(record).await?;
        Ok(())
    }

    /// Change endpoint and/or model on a saved connection. `None` keeps the
    /// saved value; an empty string clears it. The key is not decrypted; the
    /// sealed blob is carried over as is.
    pub async fn update_connection(
        &self,
        friendly_name: &str,
        endpoint: Option<String>,
        model: Option<String>,
    ) -> Result<(), VaultError> {
        let friendly_name = required("friendly_name", friendly_name)?;
        let store = self.store().await?;
        let record = self.load(store, friendly_name).await?;

        let endpoint = endpoint.or_else(|| record.endpoint.clone());
        let model = model.or_else(|| record.model.clone());
        let target = check_target(&record.service_type, endpoint.as_deref(), model.as_deref())?;
        let updated = ConnectionRecord {
            endpoint: target.endpoint,
            model: target.model,
            ..record
        };

        info!(friendly_name, "Updating connection settings");
        store.upsert_connection(updated).await?;
        Ok(())
    }

    pub async fn delete_connection(&self, friendly_name: &str) -> Result<(), VaultError> {
        let friendly_name = required("friendly_name", friendly_name)?;
        info!(friendly_name, "Deleting connection");
        self.store().await?.delete_connection(friendly_name).await?;
        Ok(())
    }

    pub async fn list_connections(&self) -> Result<Vec<ConnectionSummary>, VaultError> {
        let store = self.store().await?;
        let mut out = Vec::new();
        for name in store.list_connection_names().await? {
            // A concurrent delete can remove a name between the two reads.
            if let Some(record) = store.get_connection(&name).await? {
                out.push(record.into());
            }
        }
        Ok(out)
    }

    /// Ask for the password, decrypt, and run one generation.
    ///
    /// A wrong password leaves the record untouched and returns
    /// [`VaultError::Authentication`]; the caller may simply try again.
    pub async fn generate(
        &self,
        friendly_name: &str,
        prompt: &str,
        config: GenerationConfig,
        password_prompt: &dyn PasswordPrompt,
    ) -> Result<Outcome<String>, VaultError> {
        let friendly_name = required("friendly_name", friendly_name)?;
        let prompt = required("prompt", prompt)?;
        let store = self.store().await?;
        let record = self.load(store, friendly_name).await?;
        let service_type: ServiceType = record.service_type.parse()?;

        let mut config = config;
        if config.model.is_none() {
            config.model.clone_from(&record.model);
        }

        let mut tracker = CredentialTracker::new(friendly_name);
        let Outcome::Completed(api_key) = self
            .unlock(&record, PasswordPurpose::Unlock, password_prompt, &mut tracker)
            .await?
        else {
            return Ok(Outcome::Cancelled);
        };

        let adapter = LlmAdapter::new(
            service_type,
            self.http.clone(),
            api_key,
            record.endpoint.as_deref(),
        )?;
        let result = adapter.generate(prompt, &config).await;
        drop(adapter);
        drop(tracker);

        Ok(Outcome::Completed(result?))
    }

    /// Models offered by a saved connection's provider. The password is only
    /// requested when the provider needs the key to list.
    pub async fn available_models(
        &self,
        friendly_name: &str,
        password_prompt: &dyn PasswordPrompt,
    ) -> Result<Outcome<Vec<String>>, VaultError> {
        let friendly_name = required("friendly_name", friendly_name)?;
        let store = self.store().await?;
        let record = self.load(store, friendly_name).await?;
        let service_type: ServiceType = record.service_type.parse()?;

        let mut tracker = CredentialTracker::new(friendly_name);
        let api_key = if service_type.capability().requires_api_key_for_model_listing {
            match self
                .unlock(&record, PasswordPurpose::Unlock, password_prompt, &mut tracker)
                .await?
            {
                Outcome::Completed(key) => key,
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            }
        } else {
            Zeroizing::new(String::new())
        };

        let adapter = LlmAdapter::new(
            service_type,
            self.http.clone(),
            api_key,
            record.endpoint.as_deref(),
        )?;
        let models = adapter.get_available_models().await;
        drop(adapter);
        drop(tracker);

        Ok(Outcome::Completed(models?))
    }

    /// Models for a provider before any connection is saved, e.g. while the
    /// user is still filling in the settings form.
    pub async fn preview_models(
        &self,
        service_type: &str,
        api_key: Option<Zeroizing<String>>,
        endpoint: Option<&str>,
    ) -> Result<Vec<String>, VaultError> {
        let service_type: ServiceType = required("service_type", service_type)?.parse()?;
        let api_key = match api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ if service_type.capability().requires_api_key_for_model_listing => {
                return Err(ValidationError::MissingField("api_key").into());
            }
            _ => Zeroizing::new(String::new()),
        };

        let adapter = LlmAdapter::new(service_type, self.http.clone(), api_key, endpoint)?;
        Ok(adapter.get_available_models().await?)
    }

    /// Re-seal a saved key under a new password: one decrypt, one encrypt,
    /// one upsert. Cancelling either prompt changes nothing.
    pub async fn change_password(
        &self,
        friendly_name: &str,
        password_prompt: &dyn PasswordPrompt,
    ) -> Result<Outcome<()>, VaultError> {
        let friendly_name = required("friendly_name", friendly_name)?;
        let store = self.store().await?;
        let record = self.load(store, friendly_name).await?;

        let mut tracker = CredentialTracker::new(friendly_name);
        let Outcome::Completed(api_key) = self
            .unlock(&record, PasswordPurpose::Unlock, password_prompt, &mut tracker)
            .await?
        else {
            return Ok(Outcome::Cancelled);
        };

        let request = PasswordRequest {
            friendly_name,
            purpose: PasswordPurpose::NewPassword,
        };
        let Some(new_password) = password_prompt.request_password(request).await else {
            info!(friendly_name, "New password prompt dismissed");
            return Ok(Outcome::Cancelled);
        };
        if new_password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let encrypted_key = cipher::encrypt(&api_key, &new_password, self.cipher).await?;
        drop(api_key);
        drop(tracker);

        store
            .upsert_connection(ConnectionRecord {
                encrypted_key,
                ..record
            })
            .await?;
        info!(friendly_name, "Connection re-sealed under a new password");
        Ok(Outcome::Completed(()))
    }

    pub async fn save_draft(&self, draft: NewDraft) -> Result<LocalDraftRecord, VaultError> {
        required("title", &draft.title)?;
        let id = self.store().await?.insert_draft(draft.clone()).await?;
        info!(draft_id = id, "Draft saved");
        Ok(draft.with_id(id))
    }

    pub async fn update_draft(&self, draft: LocalDraftRecord) -> Result<(), VaultError> {
        required("title", &draft.title)?;
        self.store().await?.upsert_draft(draft).await?;
        Ok(())
    }

    pub async fn list_drafts(&self) -> Result<Vec<LocalDraftRecord>, VaultError> {
        Ok(self.store().await?.list_drafts().await?)
    }

    pub async fn delete_draft(&self, id: i64) -> Result<(), VaultError> {
        self.store().await?.delete_draft(id).await?;
        Ok(())
    }

    async fn load(
        &self,
        store: &StoreHandle,
        friendly_name: &str,
    ) -> Result<ConnectionRecord, VaultError> {
        store
            .get_connection(friendly_name)
            .await?
            .ok_or_else(|| VaultError::NotFound(friendly_name.to_string()))
    }

    /// Prompt and decrypt. Every exit path leaves the tracker consistent with
    /// what is actually held in memory.
    async fn unlock(
        &self,
        record: &ConnectionRecord,
        purpose: PasswordPurpose,
        password_prompt: &dyn PasswordPrompt,
        tracker: &mut CredentialTracker<'_>,
    ) -> Result<Outcome<Zeroizing<String>>, VaultError> {
        tracker.move_to(CredentialState::PendingPassword);
        let request = PasswordRequest {
            friendly_name: &record.friendly_name,
            purpose,
        };
        let Some(password) = password_prompt.request_password(request).await else {
            tracker.move_to(CredentialState::Encrypted);
            info!(friendly_name = %record.friendly_name, "Password prompt dismissed");
            return Ok(Outcome::Cancelled);
        };

        match cipher::decrypt(&record.encrypted_key, &password, self.cipher).await {
            Ok(api_key) => {
                tracker.move_to(CredentialState::Decrypted);
                Ok(Outcome::Completed(api_key))
            }
            Err(err) => {
                tracker.move_to(CredentialState::Encrypted);
                warn!(
                    friendly_name = %record.friendly_name,
                    error = %err,
                    "Failed to decrypt connection key"
                );
                Err(err.into())
            }
        }
    }
}
