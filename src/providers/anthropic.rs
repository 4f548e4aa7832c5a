use promptvault_schema::{AnthropicRequestBody, AnthropicResponseBody, ChatMessage};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;
use zeroize::Zeroizing;

use super::GenerationConfig;
use super::http::{ProviderHttp, resolve_endpoint, sensitive_header};
use super::wire::ProviderWire;
use crate::error::ProviderError;

pub const ANTHROPIC_DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    http: ProviderHttp,
    api_key: Zeroizing<String>,
    endpoint: Url,
}

impl AnthropicProvider {
    pub fn new(
        http: ProviderHttp,
        api_key: Zeroizing<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http,
            api_key,
            endpoint: resolve_endpoint(Self::NAME, endpoint, Some(ANTHROPIC_DEFAULT_ENDPOINT))?,
        })
    }

    /// No listing endpoint is used; callers pick a model by name.
    #[allow(clippy::unused_async)]
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

impl ProviderWire for AnthropicProvider {
    const NAME: &'static str = "Anthropic";

    type Request = AnthropicRequestBody;
    type Response = AnthropicResponseBody;

    fn http(&self) -> &ProviderHttp {
        &self.http
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn auth_headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            sensitive_header(Self::NAME, &self.api_key)?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        Ok(headers)
    }

    fn build_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Self::Request, ProviderError> {
        Ok(AnthropicRequestBody {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string()),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: config.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            temperature: config.temperature,
            top_p: config.top_p,
            extra: config.extra.clone(),
        })
    }

    fn extract_text(response: Self::Response) -> Option<String> {
        response.first_text()
    }
}
