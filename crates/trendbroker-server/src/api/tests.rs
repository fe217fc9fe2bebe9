use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;
use trendbroker_core::{ProviderOutput, TrendRequest};
use trendbroker_llm::{MemoryCache, ProviderError, ResultCache, TrendProvider};

use super::*;

struct StubProvider {
    name: &'static str,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StubProvider {
    fn new(name: &'static str, fail: bool) -> Self {
        Self {
            name,
            fail,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TrendProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "stub"
    }

    async fn call(&self, _request: &TrendRequest) -> Result<ProviderOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Decode {
                provider: "stub",
                reason: "forced failure".to_string(),
            });
        }
        Ok(ProviderOutput {
            provider: self.name.to_string(),
            model: "stub".to_string(),
            summary: "曝光上升".to_string(),
            actions_short: vec!["短".to_string()],
            actions_mid: vec![],
            actions_long: vec![],
            confidence: 0.9,
        })
    }
}

fn app(providers: Vec<Arc<dyn TrendProvider>>, cache: Option<Arc<dyn ResultCache>>) -> Router {
    let broker = Broker::new(providers, cache, Duration::from_secs(60), "zh-tw");
    build_app(
        AppState::new(Arc::new(broker)),
        &["http://localhost:4200".to_string()],
    )
}

fn payload() -> serde_json::Value {
    serde_json::json!({
        "period": {"start": "2025-06-01", "end": "2025-06-02", "days": 2},
        "top_keywords": ["信貸"],
        "dates": ["2025-06-01", "2025-06-02"],
        "series": [{"name": "信貸", "data": [3, 5]}]
    })
}

fn post(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/summarize/trend")
        .header("content-type", "application/json")
        .header("x-request-id", "req-test")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("no_provider", StatusCode::BAD_REQUEST),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ("not_found", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_configured_parts() {
    let app = app(
        vec![Arc::new(StubProvider::new("claude", false))],
        Some(Arc::new(MemoryCache::new())),
    );

    for uri in ["/v1/health", "/health"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(json["ok"], true);
        assert_eq!(json["service"], SERVICE_NAME);
        assert_eq!(json["providers"]["gemini"], false);
        assert_eq!(json["providers"]["claude"], true);
        assert_eq!(json["cache"], true);
    }
}

#[tokio::test]
async fn summarize_returns_trend_response() {
    let app = app(vec![Arc::new(StubProvider::new("gemini", false))], None);

    let response = app.oneshot(post(&payload())).await.expect("response");
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-test")
    );
    let (status, body) = read(response).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(json["provider_outputs"][0]["provider"], "gemini");
    assert_eq!(json["consensus_summary"], "【gemini】\n曝光上升");
    assert_eq!(json["period"]["start"], "2025-06-01");
}

#[tokio::test]
async fn repeated_request_is_served_byte_identical_from_cache() {
    let provider = StubProvider::new("gemini", false);
    let calls = Arc::clone(&provider.calls);
    let app = app(vec![Arc::new(provider)], Some(Arc::new(MemoryCache::new())));

    let first = app.clone().oneshot(post(&payload())).await.expect("response");
    assert_eq!(first.headers()["x-cache"], "miss");
    let (_, first_body) = read(first).await;

    let second = app.oneshot(post(&payload())).await.expect("response");
    assert_eq!(second.headers()["x-cache"], "hit");
    let (_, second_body) = read(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn length_mismatch_is_a_validation_error() {
    let provider = StubProvider::new("gemini", false);
    let calls = Arc::clone(&provider.calls);
    let app = app(vec![Arc::new(provider)], None);

    let mut body = payload();
    body["series"][0]["data"] = serde_json::json!([1]);

    let (status, text) = read(app.oneshot(post(&body)).await.expect("response")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["meta"]["request_id"], "req-test");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = app(vec![Arc::new(StubProvider::new("gemini", false))], None);
    let request = Request::builder()
        .method("POST")
        .uri("/v1/summarize/trend")
        .header("content-type", "application/json")
        .body(Body::from("{\"period\": 5}"))
        .expect("request");

    let (status, text) = read(app.oneshot(request).await.expect("response")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn missing_providers_is_rejected() {
    let app = app(vec![], None);
    let (status, text) = read(app.oneshot(post(&payload())).await.expect("response")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["error"]["code"], "no_provider");
}

#[tokio::test]
async fn all_providers_failing_is_a_bad_gateway() {
    let app = app(
        vec![
            Arc::new(StubProvider::new("gemini", true)),
            Arc::new(StubProvider::new("claude", true)),
        ],
        None,
    );
    let (status, text) = read(app.oneshot(post(&payload())).await.expect("response")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["error"]["code"], "upstream_error");
    assert_eq!(json["error"]["message"], "All LLM providers failed.");
}
