//! Search modes, cache fingerprints and backend queries.
//!
//! A [`Fingerprint`] is the (tenant, text, mode) triple itself rather than a
//! string built from it, so two fingerprints are equal only when all three
//! parts are: there is no separator a query text could forge to collide with
//! another tenant's key.
//!
//! A [`BackendQuery`] always carries the tenant it is scoped to. There is no
//! constructor without one, and backends receive the tenant and the text as
//! separate values to bind as parameters.

use crate::backend::{Results, SearchBackend};
use crate::config::DispatcherConfig;
use crate::embedding::FeatureExtractor;
use crate::tenant::TenantId;
use crate::GatewayError;
use std::fmt;
use std::sync::Arc;

/// How a query is matched against the tenant's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Text match over the title and body fields.
    Lexical,
    /// Nearest-neighbour search over feature vectors.
    Vector,
}

impl SearchMode {
    /// `vector=true` on the search endpoint selects vector mode.
    pub fn from_vector_flag(vector: bool) -> Self {
        if vector {
            SearchMode::Vector
        } else {
            SearchMode::Lexical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Lexical => "lexical",
            SearchMode::Vector => "vector",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key for one search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    tenant: TenantId,
    text: Arc<str>,
    mode: SearchMode,
}

impl Fingerprint {
    /// Validate and normalize raw search parameters. Empty query text is rejected.
    pub fn new(tenant: TenantId, text: &str, mode: SearchMode) -> Result<Self, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::invalid_request("q is required"));
        }
        Ok(Self { tenant, text: Arc::from(text), mode })
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

/// A tenant-scoped query ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendQuery {
    /// Match `text` against the title and body of `tenant`'s documents.
    Lexical { tenant: TenantId, text: String },
    /// Nearest neighbours of `vector` among `tenant`'s documents.
    Vector { tenant: TenantId, vector: Vec<f32>, target_hits: u32 },
}

impl BackendQuery {
    /// Build the backend query for a fingerprint. Vector mode embeds the query
    /// text with `extractor`.
    pub fn for_fingerprint(
        fingerprint: &Fingerprint,
        extractor: &dyn FeatureExtractor,
        config: DispatcherConfig,
    ) -> Self {
        let tenant = fingerprint.tenant().clone();
        match fingerprint.mode() {
            SearchMode::Lexical => {
                BackendQuery::Lexical { tenant, text: fingerprint.text().to_owned() }
            }
            SearchMode::Vector => {
                let vector = extractor.extract(fingerprint.text());
                BackendQuery::Vector { tenant, vector, target_hits: config.target_hits() }
            }
        }
    }

    /// Tenant every result of this query is restricted to.
    pub fn tenant(&self) -> &TenantId {
        match self {
            BackendQuery::Lexical { tenant, .. } | BackendQuery::Vector { tenant, .. } => tenant,
        }
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            BackendQuery::Lexical { .. } => SearchMode::Lexical,
            BackendQuery::Vector { .. } => SearchMode::Vector,
        }
    }

    /// Send the query to `backend`.
    pub async fn run<B>(&self, backend: &B) -> Result<Results, GatewayError>
    where
        B: SearchBackend + ?Sized,
    {
        match self {
            BackendQuery::Lexical { tenant, text } => backend.run_lexical_query(tenant, text).await,
            BackendQuery::Vector { tenant, vector, target_hits } => {
                backend.run_vector_query(tenant, vector, *target_hits).await
            }
        }
    }
}
