use promptvault_schema::{ChatMessage, OpenaiChatRequestBody, OpenaiChatResponseBody};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use url::Url;
use zeroize::Zeroizing;

use super::GenerationConfig;
use super::http::{ProviderHttp, bearer, models_url_beside, resolve_endpoint};
use super::wire::ProviderWire;
use crate::error::ProviderError;

pub const REQUESTY_CHAT_COMPLETIONS_ENDPOINT: &str =
    "https://router.requesty.ai/v1/chat/completions";

/// OpenAI-compatible router. The model has no default: the router fronts
/// many vendors and needs an explicit `vendor/model` id.
pub struct RequestyProvider {
    http: ProviderHttp,
    api_key: Zeroizing<String>,
    endpoint: Url,
}

impl RequestyProvider {
    pub fn new(
        http: ProviderHttp,
        api_key: Zeroizing<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http,
            api_key,
            endpoint: resolve_endpoint(
                Self::NAME,
                endpoint,
                Some(REQUESTY_CHAT_COMPLETIONS_ENDPOINT),
            )?,
        })
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = models_url_beside(&self.endpoint)?;
        self.http
            .list_openai_models(Self::NAME, &url, self.auth_headers()?)
            .await
    }
}

impl ProviderWire for RequestyProvider {
    const NAME: &'static str = "Requesty.ai";

    type Request = OpenaiChatRequestBody;
    type Response = OpenaiChatResponseBody;

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
        let model = config
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or(ProviderError::MissingModel {
                provider: Self::NAME,
            })?;

        // The router forwards only the model and messages.
        Ok(OpenaiChatRequestBody {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: None,
            top_p: None,
            extra: BTreeMap::new(),
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

    fn provider() -> RequestyProvider {
        let http = ProviderHttp::new(&ProvidersConfig::default()).expect("client");
        RequestyProvider::new(http, Zeroizing::new("rq-key".to_string()), None).expect("provider")
    }

    #[test]
    fn refuses_to_build_without_a_model() {
        let err = provider()
            .build_request("hi", &GenerationConfig::default())
            .expect_err("model required");
        assert!(matches!(err, ProviderError::MissingModel { provider: "Requesty.ai" }));

        let err = provider()
            .build_request("hi", &GenerationConfig::default().with_model(" "))
            .expect_err("blank model");
        assert!(matches!(err, ProviderError::MissingModel { .. }));
    }

    #[test]
    fn sends_only_model_and_messages() {
        let config = GenerationConfig {
            temperature: Some(0.9),
            ..GenerationConfig::default().with_model("openai/gpt-4o-mini")
        };
        let value = serde_json::to_value(provider().build_request("hi", &config).unwrap()).unwrap();
        assert_eq!(value["model"], "openai/gpt-4o-mini");
        assert!(value.get("temperature").is_none());
    }
}
