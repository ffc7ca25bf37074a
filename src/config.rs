//! Validated configuration for the admission controller, result cache and dispatcher.
//!
//! All values are fixed at startup; nothing here is tunable per tenant.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RATE_LIMIT: u32 = 100;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_CACHE_CAPACITY: usize = 200;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TARGET_HITS: u32 = 10;

/// Errors produced when validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Request limit must be > 0.
    #[error("rate limit must be > 0 (got {provided})")]
    InvalidLimit { provided: u32 },
    /// Window must be > 0.
    #[error("rate limit window must be > 0 (got {0:?})")]
    InvalidWindow(Duration),
    /// Cache capacity must be > 0.
    #[error("cache capacity must be > 0 (got {provided})")]
    InvalidCapacity { provided: usize },
    /// TTL must be > 0.
    #[error("cache ttl must be > 0 (got {0:?})")]
    InvalidTtl(Duration),
    /// Timeout must be non-zero and finite.
    #[error("timeout must be non-zero and finite (got {0:?})")]
    InvalidTimeout(Duration),
    /// Nearest-neighbour target hits must be > 0.
    #[error("target hits must be > 0 (got {provided})")]
    InvalidTargetHits { provided: u32 },
    /// Feature vectors need at least one component.
    #[error("embedding dimensions must be > 0 (got {provided})")]
    InvalidDimensions { provided: usize },
}

/// Fixed-window admission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    limit: u32,
    window: Duration,
}

impl AdmissionConfig {
    /// Create a config with validation.
    pub fn new(limit: u32, window: Duration) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(ConfigError::InvalidLimit { provided: limit });
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidWindow(window));
        }
        Ok(Self { limit, window })
    }

    /// Maximum admitted requests per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self { limit: DEFAULT_RATE_LIMIT, window: DEFAULT_RATE_WINDOW }
    }
}

/// Result cache bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    capacity: usize,
    ttl: Duration,
}

impl CacheConfig {
    /// Create a config with validation.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { provided: capacity });
        }
        if ttl.is_zero() {
            return Err(ConfigError::InvalidTtl(ttl));
        }
        Ok(Self { capacity, ttl })
    }

    /// Hard ceiling on stored entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time an entry stays servable after insertion.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CACHE_CAPACITY, ttl: DEFAULT_CACHE_TTL }
    }
}

/// Settings for backend query construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    target_hits: u32,
}

impl DispatcherConfig {
    pub fn new(target_hits: u32) -> Result<Self, ConfigError> {
        if target_hits == 0 {
            return Err(ConfigError::InvalidTargetHits { provided: target_hits });
        }
        Ok(Self { target_hits })
    }

    /// Number of neighbours a vector query asks the backend for.
    pub fn target_hits(&self) -> u32 {
        self.target_hits
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { target_hits: DEFAULT_TARGET_HITS }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gateway_policy() {
        let admission = AdmissionConfig::default();
        assert_eq!(admission.limit(), 100);
        assert_eq!(admission.window(), Duration::from_secs(60));

        let cache = CacheConfig::default();
        assert_eq!(cache.capacity(), 200);
        assert_eq!(cache.ttl(), Duration::from_secs(30));

        assert_eq!(DispatcherConfig::default().target_hits(), 10);
    }

    #[test]
    fn rejects_zero_values() {
        assert_eq!(
            AdmissionConfig::new(0, Duration::from_secs(1)),
            Err(ConfigError::InvalidLimit { provided: 0 })
        );
        assert_eq!(
            AdmissionConfig::new(1, Duration::ZERO),
            Err(ConfigError::InvalidWindow(Duration::ZERO))
        );
        assert_eq!(
            CacheConfig::new(0, Duration::from_secs(1)),
            Err(ConfigError::InvalidCapacity { provided: 0 })
        );
        assert_eq!(
            CacheConfig::new(1, Duration::ZERO),
            Err(ConfigError::InvalidTtl(Duration::ZERO))
        );
        assert!(DispatcherConfig::new(0).is_err());
    }
}
