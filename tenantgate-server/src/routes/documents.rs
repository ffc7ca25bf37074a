use crate::error::ApiError;
use crate::state::{AdmittedTenant, AppState, GatewayBackend};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{json, Map, Value};
use tenantgate::{prepare_for_indexing, StoredDocument, TenantId};

pub async fn create<B: GatewayBackend>(
    State(state): State<AppState<B>>,
    Extension(AdmittedTenant(tenant)): Extension<AdmittedTenant>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let id = uuid::Uuid::new_v4().to_string();
    let fields = prepare_for_indexing(&tenant, fields, state.dispatcher.extractor().as_ref());

    state.backend.index_document(&id, fields).await?;
    tracing::info!(tenant = %tenant, id = %id, "document indexed");
    Ok(Json(json!({ "id": id, "status": "indexed" })))
}

/// The document, if it exists and belongs to `tenant`.
async fn owned_document<B: GatewayBackend>(
    state: &AppState<B>,
    tenant: &TenantId,
    id: &str,
) -> Result<StoredDocument, ApiError> {
    match state.backend.get_document(id).await? {
        Some(document) if document.is_owned_by(tenant) => Ok(document),
        _ => Err(ApiError::NotFound),
    }
}

pub async fn fetch<B: GatewayBackend>(
    State(state): State<AppState<B>>,
    Extension(AdmittedTenant(tenant)): Extension<AdmittedTenant>,
    Path(id): Path<String>,
) -> Result<Json<StoredDocument>, ApiError> {
    owned_document(&state, &tenant, &id).await.map(Json)
}

pub async fn delete<B: GatewayBackend>(
    State(state): State<AppState<B>>,
    Extension(AdmittedTenant(tenant)): Extension<AdmittedTenant>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    owned_document(&state, &tenant, &id).await?;
    state.backend.delete_document(&id).await?;
    tracing::info!(tenant = %tenant, id = %id, "document deleted");
    Ok(Json(json!({ "id": id, "status": "deleted" })))
}
