//! Error types for the gateway core
use std::time::Duration;
use thiserror::Error;

/// Unified error type for admission, dispatch and backend failures.
///
/// `Clone` so that requests coalesced onto one backend call can all observe
/// the same failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Missing tenant identifier or query text; raised before admission or dispatch.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The admission controller rejected the request.
    #[error("rate limit exceeded for tenant {tenant} ({limit} requests per {window:?})")]
    RateLimited { tenant: String, limit: u32, window: Duration, retry_after: Duration },
    /// The backend could not be reached or did not answer in time.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
    /// The backend answered with an error.
    #[error("backend error (status {status:?}): {message}")]
    Backend { status: Option<u16>, message: String, detail: Option<serde_json::Value> },
}

impl GatewayError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable { reason: reason.into() }
    }

    /// Backend call exceeded its deadline.
    pub fn timed_out(elapsed: Duration, timeout: Duration) -> Self {
        Self::BackendUnavailable {
            reason: format!("backend call timed out after {:?} (limit: {:?})", elapsed, timeout),
        }
    }

    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Backend { status, message: message.into(), detail: None }
    }

    /// Attach the payload the backend returned alongside its failure.
    pub fn with_detail(mut self, payload: serde_json::Value) -> Self {
        if let Self::Backend { detail, .. } = &mut self {
            *detail = Some(payload);
        }
        self
    }

    /// Check if this error is a client-side precondition violation
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Check if this error is an admission rejection
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error came from the backend (unreachable, timed out or failed)
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. } | Self::Backend { .. })
    }

    /// How long a rate-limited caller should wait before its window resets.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Access `(limit, window)` for a rate-limit rejection.
    pub fn rate_limit_details(&self) -> Option<(u32, Duration)> {
        match self {
            Self::RateLimited { limit, window, .. } => Some((*limit, *window)),
            _ => None,
        }
    }

    /// Borrow the backend-provided failure detail, if any.
    pub fn backend_detail(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Backend { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}
