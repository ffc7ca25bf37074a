#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # tenantgate
//!
//! Core of a multi-tenant search gateway: per-tenant admission control, a
//! TTL + LRU result cache, and tenant-scoped query dispatch to a search backend.
//!
//! ## Features
//!
//! - **Fixed-window admission** per tenant, one critical section per check
//! - **Result cache** with TTL expiry, LRU eviction and a background sweeper
//! - **Query dispatch** with structural fingerprints, bounded backend calls
//!   and single-flight coalescing of identical misses
//! - **Telemetry sinks** as `tower::Service`s
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tenantgate::{AdmissionController, CacheConfig, FixedWindowLimiter, QueryDispatcher};
//! use tenantgate::{AdmissionConfig, SearchMode, TenantId};
//! use std::sync::Arc;
//!
//! # async fn run(backend: Arc<impl tenantgate::SearchBackend + 'static>) -> Result<(), tenantgate::GatewayError> {
//! let limiter = FixedWindowLimiter::new(AdmissionConfig::default());
//! let dispatcher = QueryDispatcher::new(backend, CacheConfig::default());
//!
//! let tenant = TenantId::parse("acme")?;
//! limiter.admit_now(&tenant).into_result(&tenant)?;
//! let response = dispatcher.search(&tenant, "shoes", SearchMode::Lexical).await?;
//! assert!(!response.cached);
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod embedding;
pub mod error;
pub mod query;
pub mod singleflight;
pub mod telemetry;
pub mod tenant;
pub mod timeout;

// Re-exports
pub use admission::{AdmissionController, Decision, FixedWindowLimiter};
pub use backend::{DocumentStore, InMemoryBackend, Results, SearchBackend};
pub use cache::{CacheStats, ResultCache};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AdmissionConfig, CacheConfig, ConfigError, DispatcherConfig};
pub use dispatch::{CacheSweeper, QueryDispatcher, SearchResponse};
pub use document::{prepare_for_indexing, StoredDocument};
pub use embedding::{FeatureExtractor, HashingExtractor};
pub use error::GatewayError;
pub use query::{BackendQuery, Fingerprint, SearchMode};
pub use singleflight::{Role, SingleFlight};
pub use telemetry::{GatewayEvent, LogSink, MemorySink, NullSink, TelemetrySink};
pub use tenant::TenantId;
pub use timeout::TimeoutPolicy;
