use serde::{Deserialize, Serialize};
use url::Url;

/// Remote prompts backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// TOML: `remote.base_url`. Default: `http://localhost:3000`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://localhost:3000").expect("invalid fixed remote base URL")
}
