//! Tenant identifiers.

use crate::GatewayError;
use std::fmt;
use std::sync::Arc;

/// Opaque, non-empty tenant identifier.
///
/// Construction is the only place emptiness is checked, so every component
/// that takes a `&TenantId` can rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(Arc<str>);

impl TenantId {
    /// Validate a raw identifier. Empty or whitespace-only values are rejected.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, GatewayError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(GatewayError::invalid_request("tenant is required"));
        }
        Ok(Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
