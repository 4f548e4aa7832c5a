use backon::{ExponentialBuilder, Retryable};
use promptvault_schema::{OpenaiModelList, UpstreamErrorBody};
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use crate::config::ProvidersConfig;
use crate::error::{IsRetryable, ProviderError};
use crate::utils::logging::with_pretty_json_debug;

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

const USER_AGENT: &str = concat!("promptvault/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP plumbing for every adapter: one pooled client plus the
/// per-request bound and the model-listing retry budget.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: reqwest::Client,
    request_timeout: Duration,
    model_list_retry_max_times: usize,
}

impl ProviderHttp {
    pub fn new(cfg: &ProvidersConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(cfg.request_timeout());

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        if cfg.enable_multiplexing {
            builder = builder.http2_adaptive_window(true);
        } else {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder
                .http1_only()
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Duration::from_secs(0));
        }

        let client = builder.default_headers(headers).build()?;

        Ok(Self {
            client,
            request_timeout: cfg.request_timeout(),
            model_list_retry_max_times: cfg.model_list_retry_max_times,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `GET` an OpenAI-style `/v1/models` listing and return the ids.
    ///
    /// Idempotent, so transport failures and 5xx answers are retried with a
    /// short jittered backoff. Each attempt is bounded by the request timeout.
    pub(crate) async fn list_openai_models(
        &self,
        provider: &'static str,
        url: &Url,
        headers: HeaderMap,
    ) -> Result<Vec<String>, ProviderError> {
        let policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_max_times(self.model_list_retry_max_times)
            .with_jitter();

        let client = &self.client;
        let headers = &headers;
        let timeout = self.request_timeout;

        let list = (move || async move {
            let send = async {
                let resp = client.get(url.clone()).headers(headers.clone()).send().await?;
                read_json::<OpenaiModelList>(provider, resp).await
            };
            tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| ProviderError::Timeout {
                    provider,
                    after: timeout,
                })?
        })
        .retry(policy)
        .when(|err: &ProviderError| err.is_retryable())
        .notify(|err, delay| {
            debug!(
                provider,
                error = %err,
                ?delay,
                "[{provider}] Model listing failed (will retry)"
            );
        })
        .await?;

        Ok(list.into_ids())
    }
}

/// Decode a response body as `T`, turning non-2xx answers into
/// [`ProviderError::Api`] with the provider's own message.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<T, ProviderError> {
    if !resp.status().is_success() {
        return Err(upstream_error(provider, resp).await);
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice::<T>(&bytes).map_err(|e| ProviderError::InvalidResponse {
        provider,
        detail: e.to_string(),
    })
}

/// Build [`ProviderError::Api`] from a failed response.
///
/// The message is `error.message` (or a bare `error` string) when present,
/// otherwise the JSON body verbatim, otherwise the HTTP reason phrase.
pub(crate) async fn upstream_error(
    provider: &'static str,
    resp: reqwest::Response,
) -> ProviderError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();

    let message = match serde_json::from_slice::<Value>(&bytes) {
        Ok(json) => {
            with_pretty_json_debug(&json, |pretty| {
                debug!(
                    provider,
                    %status,
                    body = %format!("{:.len$}", pretty, len = UPSTREAM_BODY_PREVIEW_CHARS),
                    "[{provider}] Upstream structured error"
                );
            });
            error_message_from_json(&json)
        }
        Err(_) => {
            let raw_body = String::from_utf8_lossy(&bytes);
            debug!(
                provider,
                %status,
                body = %format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS),
                "[{provider}] Upstream unstructured error"
            );
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), str::to_string)
        }
    };

    ProviderError::Api {
        provider,
        status,
        message,
    }
}

fn error_message_from_json(json: &Value) -> String {
    serde_json::from_value::<UpstreamErrorBody>(json.clone())
        .ok()
        .and_then(|body| body.message().map(str::to_string))
        .unwrap_or_else(|| json.to_string())
}

/// Resolve the request URL: caller override first, then the provider default.
pub(crate) fn resolve_endpoint(
    provider: &'static str,
    endpoint: Option<&str>,
    default: Option<&str>,
) -> Result<Url, ProviderError> {
    let raw = endpoint
        .filter(|s| !s.trim().is_empty())
        .or(default)
        .ok_or(ProviderError::MissingEndpoint { provider })?;
    Ok(Url::parse(raw.trim())?)
}

/// `.../v1/chat/completions` -> `.../v1/models`.
pub(crate) fn models_url_beside(chat_endpoint: &Url) -> Result<Url, ProviderError> {
    Ok(chat_endpoint.join("../models")?)
}

pub(crate) fn sensitive_header(
    provider: &'static str,
    value: &str,
) -> Result<HeaderValue, ProviderError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|_| ProviderError::InvalidCredential { provider })?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn bearer(provider: &'static str, api_key: &str) -> Result<HeaderMap, ProviderError> {
    let value = Zeroizing::new(format!("Bearer {api_key}"));
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        sensitive_header(provider, &value)?,
    );
    Ok(headers)
}
