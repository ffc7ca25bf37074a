//! Document shapes for the ingestion passthrough.

use crate::embedding::FeatureExtractor;
use crate::tenant::TenantId;
use serde::Serialize;
use serde_json::{Map, Value};

pub const TENANT_FIELD: &str = "tenantId";
pub const VECTOR_FIELD: &str = "vector";
pub const TITLE_FIELD: &str = "title";
pub const BODY_FIELD: &str = "body";

/// A document as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    /// Tenant recorded on the document, if any.
    pub fn tenant(&self) -> Option<&str> {
        self.fields.get(TENANT_FIELD).and_then(Value::as_str)
    }

    /// Whether `tenant` may see this document.
    pub fn is_owned_by(&self, tenant: &TenantId) -> bool {
        self.tenant() == Some(tenant.as_str())
    }
}

/// Prepare client-supplied fields for indexing.
///
/// The tenant and the feature vector are always set by the gateway, overriding
/// anything the client sent under those names. The vector is extracted from
/// `title + " " + body`; missing text fields count as empty.
pub fn prepare_for_indexing(
    tenant: &TenantId,
    mut fields: Map<String, Value>,
    extractor: &dyn FeatureExtractor,
) -> Map<String, Value> {
    let title = fields.get(TITLE_FIELD).and_then(Value::as_str).unwrap_or_default();
    let body = fields.get(BODY_FIELD).and_then(Value::as_str).unwrap_or_default();
    let vector = extractor.extract(&format!("{} {}", title, body));

    fields.insert(TENANT_FIELD.to_owned(), Value::String(tenant.to_string()));
    fields.insert(VECTOR_FIELD.to_owned(), Value::from(vector));
    fields
}
