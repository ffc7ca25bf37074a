use crate::error::ApiError;
use crate::state::{AdmittedTenant, AppState, GatewayBackend};
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tenantgate::{SearchMode, SearchResponse};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    vector: Option<String>,
}

/// A search whose parameters passed validation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub q: String,
    pub mode: SearchMode,
}

impl SearchParams {
    fn validate(self) -> Result<SearchRequest, ApiError> {
        let q = self
            .q
            .filter(|q| !q.trim().is_empty())
            .ok_or(ApiError::BadRequest("tenant and q are required"))?;
        let mode = SearchMode::from_vector_flag(self.vector.as_deref() == Some("true"));
        Ok(SearchRequest { q, mode })
    }
}

/// Rejects searches without a usable `q`. Layered outside admission so a
/// malformed search never spends the tenant's budget.
pub async fn validate_search(
    Query(params): Query<SearchParams>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let search = params.validate()?;
    request.extensions_mut().insert(search);
    Ok(next.run(request).await)
}

/// Backend body unchanged on a miss; on a hit, the body with `cached: true` merged in.
fn render(response: SearchResponse) -> Value {
    if !response.cached {
        return response.body;
    }
    match response.body {
        Value::Object(mut fields) => {
            fields.insert("cached".to_string(), Value::Bool(true));
            Value::Object(fields)
        }
        other => json!({ "cached": true, "results": other }),
    }
}

pub async fn search<B: GatewayBackend>(
    State(state): State<AppState<B>>,
    Extension(AdmittedTenant(tenant)): Extension<AdmittedTenant>,
    Extension(SearchRequest { q, mode }): Extension<SearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state.dispatcher.search(&tenant, &q, mode).await?;
    Ok(Json(render(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(q: Option<&str>, vector: Option<&str>) -> SearchParams {
        SearchParams { q: q.map(str::to_owned), vector: vector.map(str::to_owned) }
    }

    #[test]
    fn blank_query_is_invalid() {
        assert!(params(None, None).validate().is_err());
        assert!(params(Some("   "), Some("true")).validate().is_err());
    }

    #[test]
    fn vector_flag_selects_mode() {
        let search = params(Some("shoes"), Some("true")).validate().unwrap();
        assert_eq!(search.mode, SearchMode::Vector);
        let search = params(Some("shoes"), Some("1")).validate().unwrap();
        assert_eq!(search.mode, SearchMode::Lexical);
    }

    #[test]
    fn hit_merges_cached_flag() {
        let body = render(SearchResponse { cached: true, body: json!({ "root": {} }) });
        assert_eq!(body, json!({ "root": {}, "cached": true }));
    }

    #[test]
    fn miss_returns_body_untouched() {
        let body = render(SearchResponse { cached: false, body: json!({ "root": {} }) });
        assert_eq!(body, json!({ "root": {} }));
    }

    #[test]
    fn non_object_hit_is_wrapped() {
        let body = render(SearchResponse { cached: true, body: json!([1, 2]) });
        assert_eq!(body, json!({ "cached": true, "results": [1, 2] }));
    }
}
