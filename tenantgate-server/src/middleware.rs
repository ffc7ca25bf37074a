//! Per-tenant admission in front of the tenant-scoped routes.

use crate::error::ApiError;
use crate::state::{AdmittedTenant, AppState, GatewayBackend};
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use tenantgate::telemetry::{emit_best_effort, AdmissionEvent};
use tenantgate::{AdmissionController, Decision, GatewayEvent, TenantId};

pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Default, Deserialize)]
pub struct TenantQuery {
    tenant: Option<String>,
}

/// `tenant` query parameter first, then the `x-tenant-id` header. Empty values
/// count as absent.
pub fn resolve_tenant(query: &TenantQuery, headers: &HeaderMap) -> Option<String> {
    query
        .tenant
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok()))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

pub async fn admission_middleware<B: GatewayBackend>(
    State(state): State<AppState<B>>,
    Query(query): Query<TenantQuery>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tenant = resolve_tenant(&query, &headers)
        .and_then(|raw| TenantId::parse(raw).ok())
        .ok_or(ApiError::BadRequest("tenant required for rate limiting"))?;

    let decision = state.limiter.admit_now(&tenant);
    let event = match &decision {
        Decision::Allowed { remaining } => {
            AdmissionEvent::Allowed { tenant: tenant.clone(), remaining: *remaining }
        }
        Decision::Rejected { limit, retry_after, .. } => AdmissionEvent::Rejected {
            tenant: tenant.clone(),
            limit: *limit,
            retry_after: *retry_after,
        },
    };
    emit_best_effort(state.sink.clone(), GatewayEvent::Admission(event)).await;

    let remaining = decision.into_result(&tenant)?;

    request.extensions_mut().insert(AdmittedTenant(tenant));
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(state.limiter.limit()),
    );
    headers.insert(HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from(remaining));
    Ok(response)
}
