use crate::admission::store::{BucketStore, TenantBucket};
use crate::admission::{AdmissionController, Decision};
use crate::clock::{duration_millis, Clock, MonotonicClock};
use crate::config::AdmissionConfig;
use crate::tenant::TenantId;
use std::sync::Arc;
use std::time::Duration;

/// A fixed-window request counter per tenant.
///
/// Each tenant gets `limit` requests per `window`, counted from its first
/// request in that window. Demand rejected in one window is not carried into
/// the next, so up to `2 × limit` requests can land around a boundary.
///
/// Clones share the same buckets.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    store: BucketStore,
    config: AdmissionConfig,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(config: AdmissionConfig) -> Self {
        Self { store: BucketStore::new(), config, clock: Arc::new(MonotonicClock::default()) }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> AdmissionConfig {
        self.config
    }

    /// Bucket storage, for inspection.
    pub fn store(&self) -> &BucketStore {
        &self.store
    }

    fn step(&self, bucket: &mut TenantBucket, now: u64) -> Decision {
        let limit = self.config.limit();
        let window = self.config.window();
        let window_ms = duration_millis(window);
        let elapsed = now.saturating_sub(bucket.window_start);

        if elapsed > window_ms {
            bucket.count = 1;
            bucket.window_start = now;
            return Decision::Allowed { remaining: limit - 1 };
        }

        if bucket.count < limit {
            bucket.count += 1;
            return Decision::Allowed { remaining: limit - bucket.count };
        }

        Decision::Rejected {
            limit,
            window,
            retry_after: Duration::from_millis(window_ms - elapsed),
        }
    }
}

impl AdmissionController for FixedWindowLimiter {
    fn admit(&self, tenant: &TenantId, now_millis: u64) -> Decision {
        let decision = self.store.upsert(
            tenant,
            || {
                let remaining = self.config.limit() - 1;
                (TenantBucket::opened_at(now_millis), Decision::Allowed { remaining })
            },
            |bucket| self.step(bucket, now_millis),
        );

        if let Decision::Rejected { retry_after, .. } = &decision {
            tracing::debug!(tenant = %tenant, ?retry_after, "admission rejected");
        }
        decision
    }

    fn admit_now(&self, tenant: &TenantId) -> Decision {
        self.admit(tenant, self.clock.now_millis())
    }

    fn limit(&self) -> u32 {
        self.config.limit()
    }
}
