//! In-process backend for tests and local runs without a search engine.
//!
//! Results mimic the search engine's response shape
//! (`root.fields.totalCount`, `root.children[].fields`) so callers can be
//! exercised without special-casing.

use crate::backend::{DocumentStore, Results, SearchBackend};
use crate::document::{StoredDocument, BODY_FIELD, TENANT_FIELD, TITLE_FIELD, VECTOR_FIELD};
use crate::tenant::TenantId;
use crate::GatewayError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Faults {
    latency: Option<Duration>,
    failure: Option<GatewayError>,
}

/// Document map plus query counters.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    documents: Mutex<BTreeMap<String, Map<String, Value>>>,
    faults: Mutex<Faults>,
    queries: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every query by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        lock(&self.faults).latency = latency;
    }

    /// Fail every query with `failure` until cleared.
    pub fn set_failure(&self, failure: Option<GatewayError>) {
        lock(&self.faults).failure = failure;
    }

    /// Number of search queries received.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn document_count(&self) -> usize {
        lock(&self.documents).len()
    }

    async fn enter_query(&self) -> Result<(), GatewayError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let (latency, failure) = {
            let faults = lock(&self.faults);
            (faults.latency, faults.failure.clone())
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn tenant_documents(&self, tenant: &TenantId) -> Vec<(String, Map<String, Value>)> {
        lock(&self.documents)
            .iter()
            .filter(|(_, fields)| {
                fields.get(TENANT_FIELD).and_then(Value::as_str) == Some(tenant.as_str())
            })
            .map(|(id, fields)| (id.clone(), fields.clone()))
            .collect()
    }
}

fn field_contains(fields: &Map<String, Value>, name: &str, needle: &str) -> bool {
    fields
        .get(name)
        .and_then(Value::as_str)
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

fn dot(fields: &Map<String, Value>, query: &[f32]) -> f64 {
    let Some(stored) = fields.get(VECTOR_FIELD).and_then(Value::as_array) else {
        return f64::MIN;
    };
    stored
        .iter()
        .zip(query)
        .map(|(a, b)| a.as_f64().unwrap_or_default() * f64::from(*b))
        .sum()
}

fn hits(scored: Vec<(f64, String, Map<String, Value>)>) -> Results {
    let children: Vec<Value> = scored
        .into_iter()
        .map(|(relevance, id, mut fields)| {
            fields.remove(VECTOR_FIELD);
            let id = format!("id:default:doc::{}", id);
            json!({ "id": id, "relevance": relevance, "fields": fields })
        })
        .collect();
    json!({ "root": { "fields": { "totalCount": children.len() }, "children": children } })
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn run_lexical_query(
        &self,
        tenant: &TenantId,
        text: &str,
    ) -> Result<Results, GatewayError> {
        self.enter_query().await?;
        let needle = text.to_lowercase();
        let matched = self
            .tenant_documents(tenant)
            .into_iter()
            .filter(|(_, fields)| {
                field_contains(fields, TITLE_FIELD, &needle)
                    || field_contains(fields, BODY_FIELD, &needle)
            })
            .map(|(id, fields)| (1.0, id, fields))
            .collect();
        Ok(hits(matched))
    }

    async fn run_vector_query(
        &self,
        tenant: &TenantId,
        vector: &[f32],
        target_hits: u32,
    ) -> Result<Results, GatewayError> {
        self.enter_query().await?;
        let mut scored: Vec<_> = self
            .tenant_documents(tenant)
            .into_iter()
            .map(|(id, fields)| (dot(&fields, vector), id, fields))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(target_hits as usize);
        Ok(hits(scored))
    }
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
    async fn index_document(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), GatewayError> {
        lock(&self.documents).insert(id.to_owned(), fields);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, GatewayError> {
        let fields = lock(&self.documents).get(id).cloned();
        Ok(fields.map(|fields| StoredDocument { id: id.to_owned(), fields }))
    }

    async fn delete_document(&self, id: &str) -> Result<(), GatewayError> {
        lock(&self.documents).remove(id);
        Ok(())
    }

    async fn health(&self) -> Result<String, GatewayError> {
        match lock(&self.faults).failure.clone() {
            Some(err) => Err(err),
            None => Ok("up".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::prepare_for_indexing;
    use crate::embedding::{FeatureExtractor, HashingExtractor};

    fn tenant(id: &str) -> TenantId {
        TenantId::parse(id).unwrap()
    }

    async fn seed(backend: &InMemoryBackend, id: &str, owner: &str, title: &str) {
        let mut fields = Map::new();
        fields.insert(TITLE_FIELD.into(), Value::from(title));
        fields.insert(BODY_FIELD.into(), Value::from(""));
        let fields = prepare_for_indexing(&tenant(owner), fields, &HashingExtractor::default());
        backend.index_document(id, fields).await.unwrap();
    }

    #[tokio::test]
    async fn lexical_results_stay_within_tenant() {
        let backend = InMemoryBackend::new();
        seed(&backend, "1", "acme", "Red Shoes").await;
        seed(&backend, "2", "globex", "Blue shoes").await;

        let results = backend.run_lexical_query(&tenant("acme"), "shoes").await.unwrap();
        assert_eq!(results["root"]["fields"]["totalCount"], 1);
        assert_eq!(results["root"]["children"][0]["fields"]["tenantId"], "acme");
        assert!(results["root"]["children"][0]["fields"].get(VECTOR_FIELD).is_none());
        assert_eq!(backend.query_count(), 1);
    }

    #[tokio::test]
    async fn vector_results_respect_target_hits() {
        let backend = InMemoryBackend::new();
        for i in 0..5 {
            seed(&backend, &i.to_string(), "acme", &format!("doc {}", i)).await;
        }
        let query = HashingExtractor::default().extract("doc 3 ");
        let results = backend.run_vector_query(&tenant("acme"), &query, 2).await.unwrap();
        assert_eq!(results["root"]["fields"]["totalCount"], 2);
        assert_eq!(results["root"]["children"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let backend = InMemoryBackend::new();
        backend.set_failure(Some(GatewayError::unavailable("connection refused")));
        assert!(backend.run_lexical_query(&tenant("acme"), "x").await.is_err());
        assert!(backend.health().await.is_err());

        backend.set_failure(None);
        assert_eq!(backend.health().await.unwrap(), "up");
    }

    #[tokio::test]
    async fn documents_round_trip_through_store() {
        let backend = InMemoryBackend::new();
        seed(&backend, "1", "acme", "Red").await;
        let doc = backend.get_document("1").await.unwrap().unwrap();
        assert!(doc.is_owned_by(&tenant("acme")));

        backend.delete_document("1").await.unwrap();
        assert_eq!(backend.get_document("1").await.unwrap(), None);
        assert_eq!(backend.document_count(), 0);
    }
}
