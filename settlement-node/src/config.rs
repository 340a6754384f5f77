//! Node configuration
//!
//! Composes the intake and settlement configurations with driver settings.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use transaction_core::Currency;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Idempotency store and publisher backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Redis store and NATS JetStream publisher
    #[default]
    External,
    /// In-process store and publisher
    Memory,
}

/// Node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log output format
    pub log_format: LogFormat,

    /// Store and publisher backend
    pub backend: Backend,

    /// Per-currency outflow limits applied to every optimization
    pub liquidity_limits: HashMap<Currency, Decimal>,

    /// Intake configuration
    pub intake: intake_service::Config,

    /// Settlement optimizer configuration
    pub settlement: settlement::Config,
}

impl Config {
    /// Load from `SETTLEMENT_NODE_CONFIG` if set, otherwise from environment
    pub fn load() -> Result<Self> {
        match std::env::var("SETTLEMENT_NODE_CONFIG") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Self::from_env(),
        }
    }

    /// Load from TOML file, then apply environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let mut config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path))?;
        config.apply_env()?;
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

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(format) = std::env::var("NODE_LOG_FORMAT") {
            self.log_format = match format.as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => bail!("NODE_LOG_FORMAT: unknown format {}", other),
            };
        }

        if let Ok(backend) = std::env::var("NODE_BACKEND") {
            self.backend = match backend.as_str() {
                "external" => Backend::External,
                "memory" => Backend::Memory,
                other => bail!("NODE_BACKEND: unknown backend {}", other),
            };
        }

        if let Ok(limits) = std::env::var("NODE_LIQUIDITY_LIMITS") {
            self.liquidity_limits = parse_limits(&limits)?;
        }

        self.intake.apply_env()?;
        self.settlement.apply_env()?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.intake.validate()?;
        self.settlement.validate()?;
        if let Some((currency, _)) = self
            .liquidity_limits
            .iter()
            .find(|(_, limit)| **limit < Decimal::ZERO)
        {
            bail!("liquidity limit for {} must be >= 0", currency);
        }
        Ok(())
    }

    /// Limits to pass to the optimizer
    pub fn liquidity(&self) -> Option<&HashMap<Currency, Decimal>> {
        (!self.liquidity_limits.is_empty()).then_some(&self.liquidity_limits)
    }
}

/// Parse `USD=1000000,EUR=500000.50`
fn parse_limits(raw: &str) -> Result<HashMap<Currency, Decimal>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (currency, limit) = entry
                .split_once('=')
                .with_context(|| format!("liquidity limit {:?} is not CURRENCY=AMOUNT", entry))?;
            let currency: Currency = currency.trim().parse()?;
            let limit: Decimal = limit
                .trim()
                .parse()
                .with_context(|| format!("invalid amount for {}", currency))?;
            Ok((currency, limit))
        })
        .collect()
}
