//! LLM provider registry and adapters.
//!
//! Layout:
//! - `registry.rs`: compiled-in capability table keyed by [`ServiceType`]
//! - `http.rs`: shared reqwest client, request timeout, upstream error extraction
//! - `wire.rs`: the per-provider wire contract
//! - one file per provider with its endpoint, headers and body shapes

mod anthropic;
mod http;
mod huggingface;
mod openai;
pub mod registry;
mod requesty;
mod vertex;
mod wire;

pub use anthropic::AnthropicProvider;
pub use http::{ProviderHttp, UPSTREAM_BODY_PREVIEW_CHARS};
pub use huggingface::HuggingFaceProvider;
pub use openai::OpenaiProvider;
pub use registry::{ProviderCapability, get_capability, list_capabilities};
pub use requesty::RequestyProvider;
pub use vertex::VertexProvider;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{ProviderError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "openai")]
    Openai,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "google-vertex-ai")]
    GoogleVertexAi,
    #[serde(rename = "requesty-ai")]
    RequestyAi,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::Openai,
        ServiceType::Anthropic,
        ServiceType::HuggingFace,
        ServiceType::GoogleVertexAi,
        ServiceType::RequestyAi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Openai => "openai",
            ServiceType::Anthropic => "anthropic",
            ServiceType::HuggingFace => "huggingface",
            ServiceType::GoogleVertexAi => "google-vertex-ai",
            ServiceType::RequestyAi => "requesty-ai",
        }
    }

    pub fn capability(self) -> &'static ProviderCapability {
        registry::capability_of(self)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownServiceType(s.to_string()))
    }
}

/// Per-call generation knobs. Unset fields fall back to provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Provider-specific parameters passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GenerationConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Every set field as a flat JSON map, for bodies that take a free-form
    /// `parameters` object.
    pub(crate) fn as_parameters(&self) -> BTreeMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// One adapter per provider, chosen at runtime by [`ServiceType`].
///
/// The adapter owns the decrypted key for as long as it lives; callers keep
/// it scoped to a single operation.
pub enum LlmAdapter {
    Openai(OpenaiProvider),
    Anthropic(AnthropicProvider),
    HuggingFace(HuggingFaceProvider),
    GoogleVertexAi(VertexProvider),
    RequestyAi(RequestyProvider),
}

impl fmt::Debug for LlmAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LlmAdapter").field(&self.service_type()).finish()
    }
}

impl LlmAdapter {
    /// `endpoint` overrides the provider default; providers whose registry
    /// entry requires one fail with [`ProviderError::MissingEndpoint`] without it.
    pub fn new(
        service_type: ServiceType,
        http: ProviderHttp,
        api_key: Zeroizing<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let adapter = match service_type {
            ServiceType::Openai => Self::Openai(OpenaiProvider::new(http, api_key, endpoint)?),
            ServiceType::Anthropic => {
                Self::Anthropic(AnthropicProvider::new(http, api_key, endpoint)?)
            }
            ServiceType::HuggingFace => {
                Self::HuggingFace(HuggingFaceProvider::new(http, api_key, endpoint)?)
            }
            ServiceType::GoogleVertexAi => {
                Self::GoogleVertexAi(VertexProvider::new(http, api_key, endpoint)?)
            }
            ServiceType::RequestyAi => {
                Self::RequestyAi(RequestyProvider::new(http, api_key, endpoint)?)
            }
        };
        debug!(service_type = %service_type, "LLM adapter constructed");
        Ok(adapter)
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Openai(_) => ServiceType::Openai,
            Self::Anthropic(_) => ServiceType::Anthropic,
            Self::HuggingFace(_) => ServiceType::HuggingFace,
            Self::GoogleVertexAi(_) => ServiceType::GoogleVertexAi,
            Self::RequestyAi(_) => ServiceType::RequestyAi,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        match self {
            Self::Openai(p) => wire::generate(p, prompt, config).await,
            Self::Anthropic(p) => wire::generate(p, prompt, config).await,
            Self::HuggingFace(p) => wire::generate(p, prompt, config).await,
            Self::GoogleVertexAi(p) => wire::generate(p, prompt, config).await,
            Self::RequestyAi(p) => wire::generate(p, prompt, config).await,
        }
    }

    /// May be empty for providers without a listing API.
    pub async fn get_available_models(&self) -> Result<Vec<String>, ProviderError> {
        match self {
            Self::Openai(p) => p.list_models().await,
            Self::Anthropic(p) => p.list_models().await,
            Self::HuggingFace(p) => p.list_models().await,
            Self::GoogleVertexAi(p) => p.list_models().await,
            Self::RequestyAi(p) => p.list_models().await,
        }
    }
}
