use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use promptvault::config::ProvidersConfig;
use promptvault::error::ProviderError;
use promptvault::providers::{GenerationConfig, LlmAdapter, ProviderHttp, ServiceType};
use serde_json::{Value, json};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use url::Url;
use zeroize::Zeroizing;

#[derive(Clone, Default)]
struct CaptureState {
    hits: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<(HeaderMap, Value)>>>,
}

async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}")).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

fn http(timeout_secs: u64) -> ProviderHttp {
    let cfg = ProvidersConfig {
        request_timeout_secs: timeout_secs,
        ..ProvidersConfig::default()
    };
    ProviderHttp::new(&cfg).expect("client")
}

fn adapter(service_type: ServiceType, key: &str, endpoint: Option<&str>) -> LlmAdapter {
    LlmAdapter::new(
        service_type,
        http(5),
        Zeroizing::new(key.to_string()),
        endpoint,
    )
    .expect("adapter")
}

async fn chat_ok(
    State(state): State<CaptureState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last.lock().unwrap() = Some((headers, body));
    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello from mock"}}]
    }))
}

#[tokio::test]
async fn openai_generate_sends_bearer_and_default_model() {
    let state = CaptureState::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(state.clone());
    let base = spawn_test_server(app).await;
    let endpoint = base.join("v1/chat/completions").unwrap();

    let adapter = adapter(ServiceType::Openai, "sk-abc", Some(endpoint.as_str()));
    let text = adapter
        .generate("Say hi", &GenerationConfig::default())
        .await
        .expect("generate");
    assert_eq!(text, "Hello from mock");

    let (headers, body) = state.last.lock().unwrap().take().expect("captured");
    assert_eq!(headers["authorization"], "Bearer sk-abc");
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["messages"], json!([{"role": "user", "content": "Say hi"}]));
}

#[tokio::test]
async fn anthropic_generate_uses_api_key_header_and_max_tokens() {
    async fn messages(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        assert_eq!(headers["x-api-key"], "sk-ant");
        assert_eq!(headers["anthropic-version"], "2023-06-01");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["model"], "claude-3-opus-20240229");
        Json(json!({"content": [{"type": "text", "text": "Bonjour"}]}))
    }

    let base = spawn_test_server(Router::new().route("/v1/messages", post(messages))).await;
    let endpoint = base.join("v1/messages").unwrap();

    let adapter = adapter(ServiceType::Anthropic, "sk-ant", Some(endpoint.as_str()));
    let text = adapter
        .generate("Say hi in French", &GenerationConfig::default())
        .await
        .expect("generate");
    assert_eq!(text, "Bonjour");
}

#[tokio::test]
async fn huggingface_and_vertex_parse_their_own_shapes() {
    async fn hf(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["inputs"], "Once upon a time");
        Json(json!([{"generated_text": "Once upon a time, there was a crab."}]))
    }
    async fn vertex(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["instances"][0]["content"], "Name a color");
        Json(json!({"predictions": [{"content": "Teal"}]}))
    }

    let base = spawn_test_server(
        Router::new()
            .route("/models/gpt2", post(hf))
            .route("/v1/models/text-bison/predict", post(vertex)),
    )
    .await;

    let hf_endpoint = base.join("models/gpt2").unwrap();
    let text = adapter(ServiceType::HuggingFace, "hf_x", Some(hf_endpoint.as_str()))
        .generate("Once upon a time", &GenerationConfig::default())
        .await
        .expect("hf generate");
    assert_eq!(text, "Once upon a time, there was a crab.");

    let vertex_endpoint = base.join("v1/models/text-bison/predict").unwrap();
    let text = adapter(
        ServiceType::GoogleVertexAi,
        "ya29.token",
        Some(vertex_endpoint.as_str()),
    )
    .generate("Name a color", &GenerationConfig::default())
    .await
    .expect("vertex generate");
    assert_eq!(text, "Teal");
}

#[tokio::test]
async fn api_errors_carry_the_provider_message() {
    async fn unauthorized() -> impl IntoResponse {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": {
                    "message": "Incorrect API key provided: sk-abc",
                    "type": "invalid_request_error"
                }
            })),
        )
    }
    async fn bad_gateway() -> impl IntoResponse {
        (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
    }

    let base = spawn_test_server(
        Router::new()
            .route("/v1/chat/completions", post(unauthorized))
            .route("/broken/v1/chat/completions", post(bad_gateway)),
    )
    .await;

    let endpoint = base.join("v1/chat/completions").unwrap();
    let err = adapter(ServiceType::Openai, "sk-abc", Some(endpoint.as_str()))
        .generate("hi", &GenerationConfig::default())
        .await
        .expect_err("401");
    match err {
        ProviderError::Api {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, "OpenAI");
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Incorrect API key provided: sk-abc");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let endpoint = base.join("broken/v1/chat/completions").unwrap();
    let err = adapter(ServiceType::Openai, "sk-abc", Some(endpoint.as_str()))
        .generate("hi", &GenerationConfig::default())
        .await
        .expect_err("502");
    assert!(
        matches!(&err, ProviderError::Api { status, message, .. }
            if *status == StatusCode::BAD_GATEWAY && message == "Bad Gateway"),
        "{err:?}"
    );
}

#[tokio::test]
async fn generate_against_silent_endpoint_times_out() {
    // Accepts TCP connections at the kernel level but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().unwrap();
    let endpoint = format!("http://{addr}/v1/chat/completions");

    let adapter = LlmAdapter::new(
        ServiceType::Openai,
        http(1),
        Zeroizing::new("sk-abc".to_string()),
        Some(&endpoint),
    )
    .expect("adapter");

    let started = Instant::now();
    let err = adapter
        .generate("hello?", &GenerationConfig::default())
        .await
        .expect_err("must time out");
    let elapsed = started.elapsed();

    assert!(
        matches!(
            err,
            ProviderError::Timeout { provider: "OpenAI", after } if after == Duration::from_secs(1)
        ),
        "{err:?}"
    );
    assert!(elapsed >= Duration::from_millis(900), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    drop(listener);
}

#[tokio::test]
async fn requesty_lists_models_and_retries_server_errors() {
    async fn models(State(state): State<CaptureState>, headers: HeaderMap) -> impl IntoResponse {
        assert_eq!(headers["authorization"], "Bearer rq-key");
        if state.hits.fetch_add(1, Ordering::SeqCst) == 0 {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": {"message": "warming up"}})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "object": "list",
                "data": [
                    {"id": "openai/gpt-4o-mini", "owned_by": "openai"},
                    {"id": "anthropic/claude-3-5-sonnet"}
                ]
            })),
        )
    }

    let state = CaptureState::default();
    let base = spawn_test_server(
        Router::new()
            .route("/v1/models", get(models))
            .with_state(state.clone()),
    )
    .await;
    let endpoint = base.join("v1/chat/completions").unwrap();

    let list = adapter(ServiceType::RequestyAi, "rq-key", Some(endpoint.as_str()))
        .get_available_models()
        .await
        .expect("models");
    assert_eq!(list, vec!["openai/gpt-4o-mini", "anthropic/claude-3-5-sonnet"]);
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn model_listing_does_not_retry_client_errors() {
    async fn forbidden(State(state): State<CaptureState>) -> impl IntoResponse {
        state.hits.fetch_add(1, Ordering::SeqCst);
        (StatusCode::FORBIDDEN, Json(json!({"error": {"message": "key revoked"}})))
    }

    let state = CaptureState::default();
    let base = spawn_test_server(
        Router::new()
            .route("/v1/models", get(forbidden))
            .with_state(state.clone()),
    )
    .await;
    let endpoint = base.join("v1/chat/completions").unwrap();

    let err = adapter(ServiceType::Openai, "sk-abc", Some(endpoint.as_str()))
        .get_available_models()
        .await
        .expect_err("403");
    assert!(matches!(err, ProviderError::Api { status: StatusCode::FORBIDDEN, .. }), "{err:?}");
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn providers_without_listing_return_static_or_empty_lists() {
    let vertex = adapter(
        ServiceType::GoogleVertexAi,
        "",
        Some("https://us-central1-aiplatform.googleapis.com/v1/projects/p/locations/us-central1/publishers/google/models/text-bison:predict"),
    );
    assert!(vertex.get_available_models().await.expect("vertex").is_empty());

    let anthropic = adapter(ServiceType::Anthropic, "", None);
    assert!(anthropic.get_available_models().await.expect("anthropic").is_empty());

    let hf = adapter(
        ServiceType::HuggingFace,
        "",
        Some("https://api-inference.huggingface.co/models/gpt2"),
    );
    assert_eq!(
        hf.get_available_models().await.expect("hf"),
        vec!["gpt2", "facebook/opt-125m", "distilbert-base-uncased"]
    );
}

#[tokio::test]
async fn requesty_generate_requires_a_model_before_any_request() {
    let adapter = adapter(
        ServiceType::RequestyAi,
        "rq-key",
        Some("http://127.0.0.1:9/v1/chat/completions"),
    );
    let err = adapter
        .generate("hi", &GenerationConfig::default())
        .await
        .expect_err("no model");
    assert!(matches!(err, ProviderError::MissingModel { .. }), "{err:?}");
}
