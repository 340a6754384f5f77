//! Configuration for intake service

use crate::{Error, Result};
use message_bus::PublisherConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Intake service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Redis URL for the idempotency store
    pub redis_url: String,

    /// Deduplication configuration
    pub dedup: DedupConfig,

    /// Business rule limits
    pub limits: LimitConfig,

    /// Ordered publisher configuration
    pub publisher: PublisherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "intake-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            dedup: DedupConfig::default(),
            limits: LimitConfig::default(),
            publisher: PublisherConfig::default(),
        }
    }
}

/// Deduplication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Time-to-live for dedup entries (default: 24 hours)
    pub ttl_seconds: u64,

    /// Store key prefix
    pub key_prefix: String,

    /// Claim dedup keys with set-if-absent instead of check-then-set
    pub atomic: bool,

    /// Drop the dedup entry when publishing fails, so a retry is admitted again.
    /// Off by default: an unacknowledged publish may still have been persisted.
    pub release_on_publish_failure: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 86_400,
            key_prefix: "dedup".to_string(),
            atomic: false,
            release_on_publish_failure: false,
        }
    }
}

impl DedupConfig {
    /// Dedup TTL
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Business rule limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Maximum transaction amount (inclusive)
    pub max_amount: Decimal,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_amount: Decimal::new(99_999_999_999, 2), // 999,999,999.99
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("INTAKE_REDIS_URL") {
            self.redis_url = url;
        }

        if let Ok(ttl) = std::env::var("INTAKE_DEDUP_TTL_SECONDS") {
            self.dedup.ttl_seconds = ttl
                .parse()
                .map_err(|e| Error::Config(format!("INTAKE_DEDUP_TTL_SECONDS: {}", e)))?;
        }

        if let Ok(atomic) = std::env::var("INTAKE_DEDUP_ATOMIC") {
            self.dedup.atomic = atomic
                .parse()
                .map_err(|e| Error::Config(format!("INTAKE_DEDUP_ATOMIC: {}", e)))?;
        }

        self.publisher
            .apply_env()
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Ok(url) = std::env::var("INTAKE_NATS_URL") {
            self.publisher.nats_url = url;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.dedup.ttl_seconds == 0 {
            return Err(Error::Config("dedup.ttl_seconds must be > 0".to_string()));
        }
        if self.dedup.key_prefix.is_empty() {
            return Err(Error::Config("dedup.key_prefix must not be empty".to_string()));
        }
        if self.limits.max_amount <= Decimal::ZERO {
            return Err(Error::Config("limits.max_amount must be > 0".to_string()));
        }
        self.publisher
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}
