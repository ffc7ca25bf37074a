//! Server settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `tenantgate.toml` in the working directory, then `TENANTGATE__*`
//! environment variables with `__` between nested keys
//! (`TENANTGATE__RATE_LIMIT__LIMIT=50`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use tenantgate::{AdmissionConfig, CacheConfig, DispatcherConfig, HashingExtractor, TimeoutPolicy};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid settings: {0}")]
    Invalid(#[from] tenantgate::ConfigError),
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub vespa_endpoint: String,
    pub rate_limit: RateLimitSettings,
    pub cache: CacheSettings,
    pub backend: BackendSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitSettings {
    pub limit: u32,
    pub window_secs: u64,
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl_secs: u64,
    /// How often expired entries are swept; 0 disables the sweeper.
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct BackendSettings {
    pub timeout_ms: u64,
    pub target_hits: u32,
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dimensions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            vespa_endpoint: "http://localhost:8080".to_string(),
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            backend: BackendSettings::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { limit: 100, window_secs: 60 }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { capacity: 200, ttl_secs: 30, sweep_interval_secs: 30 }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self { timeout_ms: 5_000, target_hits: 10 }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl Settings {
    /// Load from `tenantgate.toml` (if present) and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::with_name("tenantgate").required(false))
            .add_source(
                Environment::with_prefix("TENANTGATE").separator("__").try_parsing(true),
            )
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value the core would reject, so bad settings fail at startup.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.admission()?;
        self.cache()?;
        self.timeout()?;
        self.dispatcher()?;
        self.extractor()?;
        Ok(())
    }

    pub fn admission(&self) -> Result<AdmissionConfig, tenantgate::ConfigError> {
        let window = Duration::from_secs(self.rate_limit.window_secs);
        AdmissionConfig::new(self.rate_limit.limit, window)
    }

    pub fn cache(&self) -> Result<CacheConfig, tenantgate::ConfigError> {
        CacheConfig::new(self.cache.capacity, Duration::from_secs(self.cache.ttl_secs))
    }

    pub fn timeout(&self) -> Result<TimeoutPolicy, tenantgate::ConfigError> {
        TimeoutPolicy::new(Duration::from_millis(self.backend.timeout_ms))
    }

    pub fn dispatcher(&self) -> Result<DispatcherConfig, tenantgate::ConfigError> {
        DispatcherConfig::new(self.backend.target_hits)
    }

    pub fn extractor(&self) -> Result<HashingExtractor, tenantgate::ConfigError> {
        HashingExtractor::new(self.embedding.dimensions)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        match self.cache.sweep_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
