use crate::tenant::TenantId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Request counter for one tenant's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantBucket {
    pub(crate) count: u32,
    pub(crate) window_start: u64,
}

impl TenantBucket {
    /// A bucket whose window opens at `now_millis` with one admitted request.
    pub fn opened_at(now_millis: u64) -> Self {
        Self { count: 1, window_start: now_millis }
    }

    /// Requests admitted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Clock reading (millis) at which the current window began.
    pub fn window_start(&self) -> u64 {
        self.window_start
    }
}

/// In-memory bucket storage keyed by tenant.
///
/// Buckets live for the life of the process. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct BucketStore {
    buckets: Arc<DashMap<TenantId, TenantBucket>>,
}

impl BucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `create` or `update` for `tenant` while holding the tenant's entry lock.
    ///
    /// The whole closure is one critical section: concurrent callers for the
    /// same tenant observe each other's writes in order.
    pub fn upsert<R>(
        &self,
        tenant: &TenantId,
        create: impl FnOnce() -> (TenantBucket, R),
        update: impl FnOnce(&mut TenantBucket) -> R,
    ) -> R {
        match self.buckets.entry(tenant.clone()) {
            Entry::Occupied(mut slot) => update(slot.get_mut()),
            Entry::Vacant(slot) => {
                let (bucket, out) = create();
                slot.insert(bucket);
                out
            }
        }
    }

    /// Copy of the tenant's bucket, if the tenant has been seen.
    pub fn snapshot(&self, tenant: &TenantId) -> Option<TenantBucket> {
        self.buckets.get(tenant).map(|bucket| *bucket)
    }

    /// Number of tenants seen since start.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
