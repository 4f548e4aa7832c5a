use serde::{Deserialize, Serialize};

use crate::cipher::DEFAULT_PBKDF2_ITERATIONS;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CipherConfig {
    /// PBKDF2-HMAC-SHA256 rounds per encrypt/decrypt.
    /// TOML: `cipher.pbkdf2_iterations`. Default: `100000` (also the floor).
    #[serde(default = "default_iterations")]
    pub pbkdf2_iterations: u32,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_iterations(),
        }
    }
}

fn default_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}
