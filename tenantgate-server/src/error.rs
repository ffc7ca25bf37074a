//! HTTP error mapping.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::time::Duration;
use tenantgate::GatewayError;

/// Errors returned by handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a plain message.
    BadRequest(&'static str),
    /// 404; the document is absent or belongs to another tenant.
    NotFound,
    Gateway(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

fn seconds_ceil(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn header_value(value: u64) -> HeaderValue {
    HeaderValue::from(value)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "Document not found" })))
                    .into_response()
            }
            ApiError::Gateway(GatewayError::InvalidRequest(message)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Gateway(GatewayError::RateLimited { tenant, limit, window, retry_after }) => {
                let retry_after = seconds_ceil(retry_after).max(1);
                let body = json!({
                    "error": "Rate limit exceeded",
                    "tenant": tenant,
                    "limit": limit,
                    "windowSeconds": window.as_secs(),
                    "retryAfterSeconds": retry_after,
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, header_value(retry_after));
                headers.insert(
                    HeaderName::from_static("x-ratelimit-limit"),
                    header_value(u64::from(limit)),
                );
                response
            }
            ApiError::Gateway(err) => {
                tracing::error!(error = %err, "backend request failed");
                let details = match &err {
                    GatewayError::Backend { detail: Some(detail), .. } => detail.clone(),
                    other => Value::String(other.to_string()),
                };
                let body = json!({ "error": "Internal server error", "details": details });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_with_headers() {
        let err = GatewayError::RateLimited {
            tenant: "acme".into(),
            limit: 100,
            window: Duration::from_secs(60),
            retry_after: Duration::from_millis(12_300),
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
        assert_eq!(response.headers()["x-ratelimit-limit"], "100");
    }

    #[test]
    fn backend_failures_map_to_500() {
        let unavailable = ApiError::from(GatewayError::unavailable("connection refused"));
        assert_eq!(unavailable.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let backend = ApiError::from(GatewayError::backend(Some(400), "bad"));
        assert_eq!(backend.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(seconds_ceil(Duration::from_millis(1)), 1);
        assert_eq!(seconds_ceil(Duration::from_secs(2)), 2);
        assert_eq!(seconds_ceil(Duration::ZERO), 0);
    }
}
