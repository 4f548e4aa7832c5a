use promptvault_schema::{VertexInstance, VertexRequestBody, VertexResponseBody};
use reqwest::header::HeaderMap;
use url::Url;
use zeroize::Zeroizing;

use super::GenerationConfig;
use super::http::{ProviderHttp, bearer, resolve_endpoint};
use super::wire::ProviderWire;
use crate::error::ProviderError;

/// Text models behind a project-scoped `:predict` endpoint.
pub struct VertexProvider {
    http: ProviderHttp,
    api_key: Zeroizing<String>,
    endpoint: Url,
}

impl VertexProvider {
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

    /// Listing is project and region specific; nothing is offered here.
    #[allow(clippy::unused_async)]
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

impl ProviderWire for VertexProvider {
    const NAME: &'static str = "Google Vertex AI";

    type Request = VertexRequestBody;
    type Response = VertexResponseBody;

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
        Ok(VertexRequestBody {
            instances: vec![VertexInstance {
                content: prompt.to_string(),
            }],
            parameters: config.as_parameters(),
        })
    }

    fn extract_text(response: Self::Response) -> Option<String> {
        response.first_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use serde_json::json;

    #[test]
    fn wraps_prompt_in_a_single_instance() {
        let http = ProviderHttp::new(&ProvidersConfig::default()).expect("client");
        let p = VertexProvider::new(
            http,
            Zeroizing::new("ya29.token".to_string()),
            Some("https://us-central1-aiplatform.googleapis.com/v1/projects/p/locations/us-central1/publishers/google/models/text-bison:predict"),
        )
        .expect("provider");

        let body = p
            .build_request("Summarize", &GenerationConfig {
                temperature: Some(0.5),
                ..Default::default()
            })
            .expect("body");
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"instances": [{"content": "Summarize"}], "parameters": {"temperature": 0.5}})
        );
    }
}
