use promptvault_schema::{ChatMessage, OpenaiChatRequestBody, OpenaiChatResponseBody};
use reqwest::header::HeaderMap;
use url::Url;
use zeroize::Zeroizing;

use super::GenerationConfig;
use super::http::{ProviderHttp, bearer, models_url_beside, resolve_endpoint};
use super::wire::ProviderWire;
use crate::error::ProviderError;

pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub struct OpenaiProvider {
    http: ProviderHttp,
    api_key: Zeroizing<String>,
    endpoint: Url,
}

impl OpenaiProvider {
    pub fn new(
        http: ProviderHttp,
        api_key: Zeroizing<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            http,
            api_key,
            endpoint: resolve_endpoint(Self::NAME, endpoint, Some(OPENAI_DEFAULT_ENDPOINT))?,
        })
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = models_url_beside(&self.endpoint)?;
        self.http
            .list_openai_models(Self::NAME, &url, self.auth_headers()?)
            .await
    }
}

impl ProviderWire for OpenaiProvider {
    const NAME: &'static str = "OpenAI";

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
        Ok(OpenaiChatRequestBody {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            extra: config.extra.clone(),
        })
    }

    fn extract_text(response: Self::Response) -> Option<String> {
        response.first_text()
    }
}
