//! Query dispatch: cache lookup, coalesced backend calls and cache fill.
//!
//! ```text
//! search(tenant, q, mode)
//!   -> Fingerprint            (rejects empty q)
//!   -> ResultCache::get       hit  -> cached = true
//!   -> SingleFlight::run      miss -> one bounded backend call per fingerprint
//!        -> BackendQuery::run (tenant-scoped, parameters bound)
//!        -> ResultCache::put
//!   -> cached = false
//! ```
//!
//! No lock is held while the backend call runs.

use crate::backend::{Results, SearchBackend};
use crate::cache::ResultCache;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{CacheConfig, DispatcherConfig};
use crate::embedding::{FeatureExtractor, HashingExtractor};
use crate::query::{BackendQuery, Fingerprint, SearchMode};
use crate::singleflight::{Role, SingleFlight};
use crate::telemetry::{
    emit_best_effort, BackendEvent, CacheEvent, GatewayEvent, NullSink, TelemetrySink,
};
use crate::tenant::TenantId;
use crate::timeout::TimeoutPolicy;
use crate::GatewayError;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Served from the result cache without a backend call.
    pub cached: bool,
    pub body: Results,
}

/// Answers tenant-scoped searches from the cache or the backend.
pub struct QueryDispatcher<B: ?Sized, S = NullSink> {
    backend: Arc<B>,
    cache: Arc<ResultCache<Fingerprint, Results>>,
    flights: Arc<SingleFlight<Fingerprint, Results>>,
    timeout: TimeoutPolicy,
    config: DispatcherConfig,
    extractor: Arc<dyn FeatureExtractor>,
    clock: Arc<dyn Clock>,
    sink: S,
}

impl<B: ?Sized, S: Clone> Clone for QueryDispatcher<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            cache: self.cache.clone(),
            flights: self.flights.clone(),
            timeout: self.timeout,
            config: self.config,
            extractor: self.extractor.clone(),
            clock: self.clock.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<B: ?Sized, S> std::fmt::Debug for QueryDispatcher<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDispatcher")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .field("config", &self.config)
            .finish()
    }
}

impl<B> QueryDispatcher<B, NullSink>
where
    B: SearchBackend + ?Sized + 'static,
{
    /// Dispatcher with a fresh cache, default timeout and the hashing extractor.
    pub fn new(backend: Arc<B>, cache: CacheConfig) -> Self {
        Self {
            backend,
            cache: Arc::new(ResultCache::new(cache)),
            flights: Arc::new(SingleFlight::new()),
            timeout: TimeoutPolicy::default(),
            config: DispatcherConfig::default(),
            extractor: Arc::new(HashingExtractor::default()),
            clock: Arc::new(MonotonicClock::default()),
            sink: NullSink,
        }
    }
}

impl<B, S> QueryDispatcher<B, S>
where
    B: SearchBackend + ?Sized + 'static,
    S: TelemetrySink + Sync,
    S::Future: Send + 'static,
{
    pub fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FeatureExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Attach a telemetry sink.
    pub fn with_sink<NewSink>(self, sink: NewSink) -> QueryDispatcher<B, NewSink>
    where
        NewSink: TelemetrySink + Sync,
        NewSink::Future: Send + 'static,
    {
        QueryDispatcher {
            backend: self.backend,
            cache: self.cache,
            flights: self.flights,
            timeout: self.timeout,
            config: self.config,
            extractor: self.extractor,
            clock: self.clock,
            sink,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache<Fingerprint, Results>> {
        &self.cache
    }

    pub fn extractor(&self) -> &Arc<dyn FeatureExtractor> {
        &self.extractor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Answer `text` for `tenant` in `mode`.
    pub async fn search(
        &self,
        tenant: &TenantId,
        text: &str,
        mode: SearchMode,
    ) -> Result<SearchResponse, GatewayError> {
        let fingerprint = Fingerprint::new(tenant.clone(), text, mode)?;
        self.search_fingerprint(fingerprint).await
    }

    pub async fn search_fingerprint(
        &self,
        fingerprint: Fingerprint,
    ) -> Result<SearchResponse, GatewayError> {
        let tenant = fingerprint.tenant().clone();

        if let Some(body) = self.cache.get(&fingerprint, self.clock.now_millis()) {
            tracing::debug!(tenant = %tenant, mode = %fingerprint.mode(), "cache hit");
            self.emit(GatewayEvent::Cache(CacheEvent::Hit { tenant })).await;
            return Ok(SearchResponse { cached: true, body });
        }

        tracing::debug!(tenant = %tenant, mode = %fingerprint.mode(), "cache miss");
        self.emit(GatewayEvent::Cache(CacheEvent::Miss { tenant: tenant.clone() })).await;

        let (role, outcome) =
            self.flights.run(fingerprint.clone(), || self.backend_call(fingerprint)).await;

        if role == Role::Follower {
            self.emit(GatewayEvent::Cache(CacheEvent::Coalesced { tenant })).await;
        }
        outcome.map(|body| SearchResponse { cached: false, body })
    }

    /// The leader's work: one bounded backend round trip, then cache fill.
    fn backend_call(
        &self,
        fingerprint: Fingerprint,
    ) -> BoxFuture<'static, Result<Results, GatewayError>> {
        let query =
            BackendQuery::for_fingerprint(&fingerprint, self.extractor.as_ref(), self.config);
        let backend = self.backend.clone();
        let cache = self.cache.clone();
        let clock = self.clock.clone();
        let timeout = self.timeout;
        let sink = self.sink.clone();

        async move {
            let mode = query.mode();
            let started = Instant::now();
            let outcome = timeout.execute(query.run(backend.as_ref())).await;
            let duration = started.elapsed();

            match &outcome {
                Ok(body) => {
                    let evicted = cache.put(fingerprint.clone(), body.clone(), clock.now_millis());
                    emit_best_effort(
                        sink.clone(),
                        GatewayEvent::Backend(BackendEvent::Success { mode, duration }),
                    )
                    .await;
                    emit_best_effort(
                        sink,
                        GatewayEvent::Cache(CacheEvent::Stored {
                            tenant: fingerprint.tenant().clone(),
                            evicted,
                        }),
                    )
                    .await;
                }
                Err(err) => {
                    tracing::warn!(
                        tenant = %fingerprint.tenant(),
                        %mode,
                        error = %err,
                        "backend query failed"
                    );
                    let event = if timed_out(err, duration, timeout.duration()) {
                        BackendEvent::TimedOut { mode, timeout: timeout.duration() }
                    } else {
                        BackendEvent::Failure { mode, duration }
                    };
                    emit_best_effort(sink, GatewayEvent::Backend(event)).await;
                }
            }
            outcome
        }
        .boxed()
    }

    async fn emit(&self, event: GatewayEvent) {
        emit_best_effort(self.sink.clone(), event).await;
    }

    /// Start a background task purging expired cache entries every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> CacheSweeper {
        let cache = self.cache.clone();
        let clock = self.clock.clone();
        let sink = self.sink.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = cache.purge_expired(clock.now_millis());
                if expired > 0 {
                    tracing::debug!(expired, "swept expired cache entries");
                    let event = GatewayEvent::Cache(CacheEvent::Swept { expired });
                    emit_best_effort(sink.clone(), event).await;
                }
            }
        });
        CacheSweeper { handle }
    }
}

fn timed_out(err: &GatewayError, elapsed: Duration, limit: Duration) -> bool {
    matches!(err, GatewayError::BackendUnavailable { .. }) && elapsed >= limit
}

/// Handle to the background cache sweeper. Dropping it stops the task.
#[derive(Debug)]
pub struct CacheSweeper {
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
