mod basic;
mod cipher;
mod providers;
mod remote;

pub use basic::BasicConfig;
pub use cipher::CipherConfig;
pub use providers::ProvidersConfig;
pub use remote::RemoteConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};
use thiserror::Error as ThisError;

use crate::cipher::MIN_PBKDF2_ITERATIONS;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Storage and logging (see `basic` table in promptvault.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Key derivation cost (see `cipher` table).
    #[serde(default)]
    pub cipher: CipherConfig,

    /// Upstream LLM HTTP settings (see `providers` table).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Remote prompts backend (see `remote` table).
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("cipher.pbkdf2_iterations must be at least {min} (got {0})", min = MIN_PBKDF2_ITERATIONS)]
    IterationsTooLow(u32),

    #[error("providers.request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

pub const DEFAULT_CONFIG_FILE: &str = "promptvault.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `promptvault.toml` if present,
    /// then validates it.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg: Self = Self::figment().extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cipher.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            return Err(ConfigError::IterationsTooLow(self.cipher.pbkdf2_iterations));
        }
        if self.providers.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance used by the binary.
///
/// Panics on first access if the file is present but invalid.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|err| panic!("invalid {DEFAULT_CONFIG_FILE}: {err}"))
});

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Toml;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.basic.database_url, "sqlite://promptvault.db");
        assert_eq!(cfg.cipher.pbkdf2_iterations, 100_000);
        assert_eq!(cfg.providers.request_timeout_secs, 10);
        assert_eq!(cfg.remote.base_url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                loglevel = "debug"

                [providers]
                request_timeout_secs = 30
                proxy = "http://127.0.0.1:1080"
                "#,
            ))
            .extract()
            .expect("extract");

        assert_eq!(cfg.basic.loglevel, "debug");
        assert_eq!(cfg.basic.database_url, "sqlite://promptvault.db");
        assert_eq!(cfg.providers.request_timeout_secs, 30);
        assert_eq!(
            cfg.providers.proxy.as_ref().map(url::Url::as_str),
            Some("http://127.0.0.1:1080/")
        );
    }

    #[test]
    fn misspelled_keys_are_rejected_in_every_table() {
        for table in [
            "[basic]\ndatabse_url = \"sqlite::memory:\"",
            "[remote]\nbase_ur = \"http://127.0.0.1:3000\"",
        ] {
            let result = Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::string(table))
                .extract::<Config>();
            assert!(result.is_err(), "{table}");
        }
    }

    #[test]
    fn low_iteration_count_is_rejected() {
        let mut cfg = Config::default();
        cfg.cipher.pbkdf2_iterations = 1_000;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::IterationsTooLow(1_000))
        ));
    }
}
