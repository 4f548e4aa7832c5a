use serde::{Deserialize, Serialize};

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BasicConfig {
    /// Database URL for the local SQLite record store.
    /// TOML: `basic.database_url`. Default: `sqlite://promptvault.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Fallback tracing level when `RUST_LOG` is unset ("error" through "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            loglevel: default_loglevel(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://promptvault.db".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}
