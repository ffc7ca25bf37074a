use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tenantgate::{GatewayError, InMemoryBackend};
use tenantgate_server::{build_state, router, Settings};
use tower::ServiceExt;

fn app_with(settings: Settings) -> (Router, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let state = build_state(&settings, backend.clone()).unwrap();
    (router(state), backend)
}

fn app() -> (Router, Arc<InMemoryBackend>) {
    app_with(Settings::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap()
}

async fn index(app: &Router, tenant: &str, title: &str) -> String {
    let (status, _, body) = send(
        app,
        post_json(
            &format!("/documents?tenant={}", tenant),
            json!({"title": title, "body": "sale"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "indexed");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn missing_tenant_is_rejected_before_admission() {
    let (app, backend) = app();
    let (status, _, body) = send(&app, get("/search?q=shoes")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant required for rate limiting");
    assert_eq!(backend.query_count(), 0);
}

#[tokio::test]
async fn missing_query_is_bad_request() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/search?tenant=acme")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant and q are required");
}

#[tokio::test]
async fn invalid_searches_do_not_spend_budget() {
    let mut settings = Settings::default();
    settings.rate_limit.limit = 2;
    let (app, backend) = app_with(settings);

    for uri in ["/search?tenant=acme", "/search?tenant=acme&q=%20%20", "/search?tenant=acme"] {
        let (status, headers, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!headers.contains_key("x-ratelimit-remaining"));
    }
    assert_eq!(backend.query_count(), 0);

    let (status, headers, _) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-ratelimit-remaining"], "1");
    let (status, headers, _) = send(&app, get("/search?tenant=acme&q=boots")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-ratelimit-remaining"], "0");

    // exhausted tenant still gets the validation error, not 429
    let (status, _, body) = send(&app, get("/search?tenant=acme")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tenant and q are required");
    let (status, _, _) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn search_is_cached_on_repeat() {
    let (app, backend) = app();
    index(&app, "acme", "red shoes").await;

    let (status, headers, first) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first.get("cached").is_none());
    assert_eq!(first["root"]["fields"]["totalCount"], 1);
    assert_eq!(headers["x-ratelimit-limit"], "100");

    let (_, _, second) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["root"], first["root"]);
    assert_eq!(backend.query_count(), 1);
}

#[tokio::test]
async fn tenant_header_is_accepted() {
    let (app, _) = app();
    index(&app, "acme", "red shoes").await;

    let request = Request::builder()
        .uri("/search?q=shoes&vector=true")
        .header("x-tenant-id", "acme")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["root"]["children"][0]["fields"]["tenantId"], "acme");
}

#[tokio::test]
async fn search_results_are_tenant_scoped() {
    let (app, _) = app();
    index(&app, "acme", "red shoes").await;
    index(&app, "globex", "blue shoes").await;

    let (_, _, body) = send(&app, get("/search?tenant=globex&q=shoes")).await;
    assert_eq!(body["root"]["fields"]["totalCount"], 1);
    assert_eq!(body["root"]["children"][0]["fields"]["tenantId"], "globex");
}

#[tokio::test]
async fn exceeding_the_limit_returns_429_with_metadata() {
    let mut settings = Settings::default();
    settings.rate_limit.limit = 2;
    let (app, _) = app_with(settings);

    for _ in 0..2 {
        let (status, _, _) = send(&app, get("/search?tenant=acme&q=shoes")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, headers, body) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded");
    assert_eq!(body["tenant"], "acme");
    assert_eq!(body["limit"], 2);
    assert_eq!(body["windowSeconds"], 60);
    assert!(headers.contains_key(header::RETRY_AFTER));
    assert_eq!(headers["x-ratelimit-limit"], "2");

    // other tenants keep their own window
    let (status, _, _) = send(&app, get("/search?tenant=globex&q=shoes")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let mut settings = Settings::default();
    settings.rate_limit.limit = 1;
    let (app, _) = app_with(settings);

    for _ in 0..5 {
        let (status, _, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        assert_eq!(body["vespa"], "up");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn health_reports_down_backend() {
    let (app, backend) = app();
    backend.set_failure(Some(GatewayError::unavailable("connection refused")));
    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vespa"], "DOWN");
}

#[tokio::test]
async fn indexing_sets_tenant_and_vector() {
    let (app, backend) = app();
    let (_, _, body) = send(
        &app,
        post_json(
            "/documents?tenant=acme",
            json!({"title": "t", "body": "b", "tenantId": "globex"}),
        ),
    )
    .await;
    let id = body["id"].as_str().unwrap();

    let (status, _, doc) = send(&app, get(&format!("/documents/{}?tenant=acme", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["id"], id);
    assert_eq!(doc["fields"]["tenantId"], "acme");
    assert_eq!(doc["fields"]["vector"].as_array().map(Vec::len), Some(128));
    assert_eq!(backend.document_count(), 1);
}

#[tokio::test]
async fn documents_are_invisible_to_other_tenants() {
    let (app, backend) = app();
    let id = index(&app, "acme", "red shoes").await;

    let (status, _, _) = send(&app, get(&format!("/documents/{}?tenant=globex", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, delete(&format!("/documents/{}?tenant=globex", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(backend.document_count(), 1);

    let (status, _, body) = send(&app, delete(&format!("/documents/{}?tenant=acme", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "status": "deleted"}));
    assert_eq!(backend.document_count(), 0);
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let (app, _) = app();
    let (status, _, _) = send(&app, get("/documents/nope?tenant=acme")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn backend_failure_is_internal_server_error() {
    let (app, backend) = app();
    backend.set_failure(Some(
        GatewayError::backend(Some(400), "vespa returned 400")
            .with_detail(json!({"root": {"errors": []}})),
    ));

    let (status, _, body) = send(&app, get("/search?tenant=acme&q=shoes")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["details"], json!({"root": {"errors": []}}));
}
