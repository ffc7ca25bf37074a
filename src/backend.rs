//! Interfaces to the search/index backend.
//!
//! The core reaches the backend only through these traits. Adapters (the
//! `tenantgate-vespa` crate, or in-memory fakes in tests) implement them.

use crate::document::StoredDocument;
use crate::tenant::TenantId;
use crate::GatewayError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod memory;
pub use memory::InMemoryBackend;

/// Backend result set, opaque to the gateway.
pub type Results = Value;

/// Tenant-scoped query execution.
///
/// Implementations must restrict every result to `tenant` and must pass
/// `text` to the backend as data, never as query syntax.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Text match of `text` against the tenant's documents.
    async fn run_lexical_query(&self, tenant: &TenantId, text: &str)
        -> Result<Results, GatewayError>;

    /// Nearest-neighbour search around `vector` among the tenant's documents,
    /// asking for up to `target_hits` neighbours.
    async fn run_vector_query(
        &self,
        tenant: &TenantId,
        vector: &[f32],
        target_hits: u32,
    ) -> Result<Results, GatewayError>;
}

/// Document passthrough and health probing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace document `id` with `fields`.
    async fn index_document(&self, id: &str, fields: Map<String, Value>)
        -> Result<(), GatewayError>;

    /// Fetch document `id`; `Ok(None)` when it does not exist.
    async fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, GatewayError>;

    async fn delete_document(&self, id: &str) -> Result<(), GatewayError>;

    /// Backend health status code (e.g. `"up"`).
    async fn health(&self) -> Result<String, GatewayError>;
}

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for Arc<T> {
    async fn run_lexical_query(
        &self,
        tenant: &TenantId,
        text: &str,
    ) -> Result<Results, GatewayError> {
        (**self).run_lexical_query(tenant, text).await
    }

    async fn run_vector_query(
        &self,
        tenant: &TenantId,
        vector: &[f32],
        target_hits: u32,
    ) -> Result<Results, GatewayError> {
        (**self).run_vector_query(tenant, vector, target_hits).await
    }
}
