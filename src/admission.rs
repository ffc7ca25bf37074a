//! Per-tenant admission control.
//!
//! This module provides the building blocks for admission:
//! - [`AdmissionController`]: The core trait for admission decisions.
//! - [`Decision`]: The result of an admission check (Allowed/Rejected).
//!
//! # Architecture
//!
//! - **Logic**: [`FixedWindowLimiter`] (in `fixed_window`) handles the window arithmetic.
//! - **Storage**: [`BucketStore`] (in `store`) owns the per-tenant buckets and the
//!   per-tenant critical section every check-and-increment runs in.
//!
//! The frontend asks an `AdmissionController` before routing a request; it does not
//! know *how* the limit is enforced.

use crate::tenant::TenantId;
use crate::GatewayError;
use std::time::Duration;

pub mod fixed_window;
pub mod store;
pub use fixed_window::FixedWindowLimiter;
pub use store::{BucketStore, TenantBucket};

/// The decision returned by an admission controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request is admitted.
    Allowed {
        /// Permits left in the current window.
        /// Useful for `X-RateLimit-Remaining` headers.
        remaining: u32,
    },
    /// The tenant has used up its window.
    Rejected {
        /// Configured requests per window.
        limit: u32,
        /// Configured window length.
        window: Duration,
        /// Time until the current window ends.
        /// Useful for `Retry-After` headers.
        retry_after: Duration,
    },
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Turn a rejection into [`GatewayError::RateLimited`] for `tenant`.
    pub fn into_result(self, tenant: &TenantId) -> Result<u32, GatewayError> {
        match self {
            Decision::Allowed { remaining } => Ok(remaining),
            Decision::Rejected { limit, window, retry_after } => Err(GatewayError::RateLimited {
                tenant: tenant.to_string(),
                limit,
                window,
                retry_after,
            }),
        }
    }
}

/// Core interface for admission logic.
///
/// Implementations never fail: a missing tenant is rejected by the caller
/// before an admission decision is requested.
pub trait AdmissionController: Send + Sync {
    /// Decide for `tenant` at the given clock reading.
    fn admit(&self, tenant: &TenantId, now_millis: u64) -> Decision;

    /// Decide for `tenant` using the controller's own clock.
    fn admit_now(&self, tenant: &TenantId) -> Decision;

    /// Configured requests per window.
    fn limit(&self) -> u32;
}
