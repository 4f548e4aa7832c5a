use promptvault_schema::{HuggingFaceRequestBody, HuggingFaceResponseBody};
use reqwest::header::HeaderMap;
use url::Url;
use zeroize::Zeroizing;

use super::GenerationConfig;
use super::http::{ProviderHttp, bearer, resolve_endpoint};
use super::wire::ProviderWire;
use crate::error::ProviderError;

/// Curated: the Inference API has no single listing endpoint.
pub const HUGGINGFACE_MODELS: [&str; 3] = ["gpt2", "facebook/opt-125m", "distilbert-base-uncased"];

pub struct HuggingFaceProvider {
    http: ProviderHttp,
    api_key: Zeroizing<String>,
    endpoint: Url,
}

impl HuggingFaceProvider {
    pub fn new(
        http: ProviderHttp,
        api_key: Zeroizing<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http,
            api_key,
            endpoint: resolve_endpoint(Self::NAME, endpoint, None)?,
        })
    }

    #[allow(clippy::unused_async)]
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(HUGGINGFACE_MODELS.iter().map(ToString::to_string).collect())
    }
}

impl ProviderWire for HuggingFaceProvider {
    const NAME: &'static str = "Hugging Face";

    type Request = HuggingFaceRequestBody;
    type Response = HuggingFaceResponseBody;

    fn http(&self) -> &ProviderHttp {
        &self.http
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn auth_headers(&self) -> Result<HeaderMap, ProviderError> {
        bearer(Self::NAME, &self.api_key)
    }

    fn build_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Self::Request, ProviderError> {
        Ok(HuggingFaceRequestBody {
            inputs: prompt.to_string(),
            parameters: config.as_parameters(),
        })
    }

    fn extract_text(response: Self::Response) -> Option<String> {
        response.into_iter().next().map(|g| g.generated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use serde_json::json;

    fn http() -> ProviderHttp {
        ProviderHttp::new(&ProvidersConfig::default()).expect("client")
    }

    #[test]
    fn endpoint_is_mandatory() {
        let err = HuggingFaceProvider::new(http(), Zeroizing::new("hf_x".to_string()), None)
            .err()
            .expect("missing endpoint");
        assert!(matches!(err, ProviderError::MissingEndpoint { .. }));
    }

    #[test]
    fn config_travels_as_parameters() {
        let p = HuggingFaceProvider::new(
            http(),
            Zeroizing::new("hf_x".to_string()),
            Some("https://api-inference.huggingface.co/models/gpt2"),
        )
        .expect("provider");
        let config = GenerationConfig {
            max_tokens: Some(20),
            ..Default::default()
        };

        let value = serde_json::to_value(p.build_request("Once upon", &config).unwrap()).unwrap();
        assert_eq!(value, json!({"inputs": "Once upon", "parameters": {"max_tokens": 20}}));
    }
}
