use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::GenerationConfig;
use super::http::{ProviderHttp, read_json};
use crate::error::ProviderError;

/// What differs between providers on the generate path. Everything else
/// (timeout, error extraction, logging) lives in [`generate`].
pub(crate) trait ProviderWire {
    /// Human-facing name used in errors and log lines.
    const NAME: &'static str;

    type Request: Serialize;
    type Response: DeserializeOwned;

    fn http(&self) -> &ProviderHttp;

    fn endpoint(&self) -> &Url;

    /// Built per call from the held key so no header copy outlives the request.
    fn auth_headers(&self) -> Result<HeaderMap, ProviderError>;

    fn build_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Self::Request, ProviderError>;

    fn extract_text(response: Self::Response) -> Option<String>;
}

pub(crate) async fn generate<P: ProviderWire>(
    provider: &P,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<String, ProviderError> {
    let body = provider.build_request(prompt, config)?;
    let headers = provider.auth_headers()?;
    let http = provider.http();
    let after = http.request_timeout();
    let name = P::NAME;

    let start = Instant::now();
    let exchange = async {
        let resp = http
            .client()
            .post(provider.endpoint().clone())
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        read_json::<P::Response>(name, resp).await
    };

    let result = match tokio::time::timeout(after, exchange).await {
        Ok(result) => result,
        Err(_) => {
            warn!(provider = name, ?after, "[{name}] Generate request timed out");
            return Err(ProviderError::Timeout {
                provider: name,
                after,
            });
        }
    };

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            warn!(
                provider = name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "[{name}] Generate request failed"
            );
            return Err(err);
        }
    };

    let text = P::extract_text(response).ok_or_else(|| ProviderError::InvalidResponse {
        provider: name,
        detail: "response carried no generated text".to_string(),
    })?;

    info!(
        provider = name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        chars = text.chars().count(),
        "[{name}] Generate completed"
    );
    debug!(provider = name, endpoint = %provider.endpoint(), "[{name}] Generate endpoint");

    Ok(text)
}
