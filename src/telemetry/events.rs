use crate::query::SearchMode;
use crate::tenant::TenantId;
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// Gateway events emitted while serving a request.
///
/// Each component reports what it decided (admit/reject, hit/miss, backend
/// outcome) so sinks can log, aggregate or forward the decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// Admission controller decisions
    Admission(AdmissionEvent),
    /// Result cache activity
    Cache(CacheEvent),
    /// Backend round trips
    Backend(BackendEvent),
}

/// Events emitted by the admission controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionEvent {
    /// The request was admitted.
    Allowed {
        tenant: TenantId,
        /// Permits left in the current window
        remaining: u32,
    },
    /// The tenant exhausted its window.
    Rejected {
        tenant: TenantId,
        limit: u32,
        /// Time until the window resets
        retry_after: Duration,
    },
}

/// Events emitted around the result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Served from cache.
    Hit { tenant: TenantId },
    /// Not cached (absent or expired); a backend call follows.
    Miss { tenant: TenantId },
    /// Joined a backend call already in flight for the same fingerprint.
    Coalesced { tenant: TenantId },
    /// A fresh backend result was stored.
    Stored {
        tenant: TenantId,
        /// Entries evicted to stay within capacity
        evicted: usize,
    },
    /// A proactive sweep removed expired entries.
    Swept { expired: usize },
}

/// Events emitted by backend dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    /// Backend answered successfully.
    Success { mode: SearchMode, duration: Duration },
    /// Backend answered with, or failed with, an error.
    Failure { mode: SearchMode, duration: Duration },
    /// The backend call exceeded its deadline.
    TimedOut { mode: SearchMode, timeout: Duration },
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEvent::Admission(event) => write!(f, "Admission::{}", event),
            GatewayEvent::Cache(event) => write!(f, "Cache::{}", event),
            GatewayEvent::Backend(event) => write!(f, "Backend::{}", event),
        }
    }
}

impl fmt::Display for AdmissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionEvent::Allowed { tenant, remaining } => {
                write!(f, "Allowed({}, remaining={})", tenant, remaining)
            }
            AdmissionEvent::Rejected { tenant, limit, retry_after } => {
                write!(f, "Rejected({}, limit={}, retry_after={:?})", tenant, limit, retry_after)
            }
        }
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::Hit { tenant } => write!(f, "Hit({})", tenant),
            CacheEvent::Miss { tenant } => write!(f, "Miss({})", tenant),
            CacheEvent::Coalesced { tenant } => write!(f, "Coalesced({})", tenant),
            CacheEvent::Stored { tenant, evicted } => {
                write!(f, "Stored({}, evicted={})", tenant, evicted)
            }
            CacheEvent::Swept { expired } => write!(f, "Swept(expired={})", expired),
        }
    }
}

impl fmt::Display for BackendEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendEvent::Success { mode, duration } => {
                write!(f, "Success({}, duration={:?})", mode, duration)
            }
            BackendEvent::Failure { mode, duration } => {
                write!(f, "Failure({}, duration={:?})", mode, duration)
            }
            BackendEvent::TimedOut { mode, timeout } => {
                write!(f, "TimedOut({}, timeout={:?})", mode, timeout)
            }
        }
    }
}

#[inline]
fn clamp_u64(val: u128) -> u64 {
    val.min(u128::from(u64::MAX)) as u64
}

/// Convert a GatewayEvent into a JSON value for sinks.
pub fn event_to_json(event: &GatewayEvent) -> serde_json::Value {
    match event {
        GatewayEvent::Admission(a) => match a {
            AdmissionEvent::Allowed { tenant, remaining } => json!({
                "kind": "admission_allowed",
                "tenant": tenant.as_str(),
                "remaining": *remaining,
            }),
            AdmissionEvent::Rejected { tenant, limit, retry_after } => json!({
                "kind": "admission_rejected",
                "tenant": tenant.as_str(),
                "limit": *limit,
                "retry_after_ms": clamp_u64(retry_after.as_millis()),
            }),
        },
        GatewayEvent::Cache(c) => match c {
            CacheEvent::Hit { tenant } => json!({ "kind": "cache_hit", "tenant": tenant.as_str() }),
            CacheEvent::Miss { tenant } => {
                json!({ "kind": "cache_miss", "tenant": tenant.as_str() })
            }
            CacheEvent::Coalesced { tenant } => {
                json!({ "kind": "cache_coalesced", "tenant": tenant.as_str() })
            }
            CacheEvent::Stored { tenant, evicted } => json!({
                "kind": "cache_stored",
                "tenant": tenant.as_str(),
                "evicted": *evicted,
            }),
            CacheEvent::Swept { expired } => json!({ "kind": "cache_swept", "expired": *expired }),
        },
        GatewayEvent::Backend(b) => match b {
            BackendEvent::Success { mode, duration } => json!({
                "kind": "backend_success",
                "mode": mode.as_str(),
                "duration_ms": clamp_u64(duration.as_millis()),
            }),
            BackendEvent::Failure { mode, duration } => json!({
                "kind": "backend_failure",
                "mode": mode.as_str(),
                "duration_ms": clamp_u64(duration.as_millis()),
            }),
            BackendEvent::TimedOut { mode, timeout } => json!({
                "kind": "backend_timeout",
                "mode": mode.as_str(),
                "timeout_ms": clamp_u64(timeout.as_millis()),
            }),
        },
    }
}
