use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Upstream LLM HTTP settings shared by every adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Bound on a single `generate` call, connect to last body byte.
    /// TOML: `providers.request_timeout_secs`. Default: `10`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `providers.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// Max retry attempts for model listing (idempotent GET only).
    /// TOML: `providers.model_list_retry_max_times`. Default: `2`.
    #[serde(default = "default_model_list_retry_max_times")]
    pub model_list_retry_max_times: usize,
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
            enable_multiplexing: false,
            model_list_retry_max_times: default_model_list_retry_max_times(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_model_list_retry_max_times() -> usize {
    2
}
