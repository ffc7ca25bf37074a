//! Vespa backend for `tenantgate`.
//!
//! [`VespaClient`] implements both [`SearchBackend`] (tenant-scoped YQL over
//! the search API) and [`DocumentStore`] (document/v1 passthrough and the
//! state/v1 health probe).

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tenantgate::{DocumentStore, GatewayError, Results, SearchBackend, StoredDocument, TenantId};
use thiserror::Error;
use url::Url;

pub mod yql;

const DOCUMENT_PATH: [&str; 5] = ["document", "v1", "default", "doc", "docid"];

/// Errors building a [`VespaClient`].
#[derive(Debug, Error)]
pub enum VespaError {
    #[error("invalid vespa endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("vespa endpoint must be an http(s) base url: {0}")]
    NotABase(String),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct VespaClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl VespaClient {
    /// Client for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, VespaError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(http, endpoint)
    }

    /// Bring-your-own `reqwest` client.
    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Result<Self, VespaError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() || !matches!(endpoint.scheme(), "http" | "https") {
            return Err(VespaError::NotABase(endpoint.to_string()));
        }
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `endpoint` with `segments` appended, each percent-encoded as one segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn search_url(&self) -> Url {
        self.url(&["search", ""])
    }

    pub fn document_url(&self, id: &str) -> Url {
        let mut segments = DOCUMENT_PATH.to_vec();
        segments.push(id);
        self.url(&segments)
    }

    pub fn health_url(&self) -> Url {
        self.url(&["state", "v1", "health"])
    }

    async fn search(&self, body: Value) -> Result<Results, GatewayError> {
        let response =
            self.http.post(self.search_url()).json(&body).send().await.map_err(transport_error)?;
        read_json(response).await
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() || err.is_connect() {
        tracing::warn!(error = %err, "vespa unreachable");
        GatewayError::unavailable(err.to_string())
    } else {
        GatewayError::backend(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// Decode a response body, turning non-2xx statuses into `GatewayError::Backend`
/// with the payload attached.
async fn read_json(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport_error)?;
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    if status.is_success() {
        Ok(body)
    } else {
        tracing::warn!(%status, "vespa request failed");
        Err(GatewayError::backend(Some(status.as_u16()), format!("vespa returned {}", status))
            .with_detail(body))
    }
}

#[async_trait]
impl SearchBackend for VespaClient {
    async fn run_lexical_query(
        &self,
        tenant: &TenantId,
        text: &str,
    ) -> Result<Results, GatewayError> {
        self.search(yql::lexical_request(tenant, text)).await
    }

    async fn run_vector_query(
        &self,
        tenant: &TenantId,
        vector: &[f32],
        target_hits: u32,
    ) -> Result<Results, GatewayError> {
        self.search(yql::vector_request(tenant, vector, target_hits)).await
    }
}

#[async_trait]
impl DocumentStore for VespaClient {
    async fn index_document(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.document_url(id))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await.map(|_| ())
    }

    async fn get_document(&self, id: &str) -> Result<Option<StoredDocument>, GatewayError> {
        let response =
            self.http.get(self.document_url(id)).send().await.map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = read_json(response).await?;
        let fields = match body.get("fields") {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Map::new(),
        };
        Ok(Some(StoredDocument { id: id.to_owned(), fields }))
    }

    async fn delete_document(&self, id: &str) -> Result<(), GatewayError> {
        let response =
            self.http.delete(self.document_url(id)).send().await.map_err(transport_error)?;
        read_json(response).await.map(|_| ())
    }

    async fn health(&self) -> Result<String, GatewayError> {
        let response = self.http.get(self.health_url()).send().await.map_err(transport_error)?;
        let body = read_json(response).await?;
        Ok(body["status"]["code"].as_str().unwrap_or("unknown").to_owned())
    }
}
