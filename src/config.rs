//! Configuration loading from TOML.
//!
//! Reads `config.toml` into strongly-typed sections. Every section except
//! the watched market list has working defaults, so a minimal file only
//! needs `[polling]` with a snapshot path.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::poller::{WatchedMarket, DEFAULT_POLL_INTERVAL_SECS};
use crate::pricing::{ReturnCalculator, ReturnConfig};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// Protocol fee override in basis points. Unset means the protocol's
    /// own rate.
    #[serde(default)]
    pub protocol_fee_bps: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// JSON chain snapshot the pools and reputations are read from.
    pub snapshot_path: String,
    /// Address whose reputation progress is logged each cycle.
    #[serde(default)]
    pub reputation_owner: Option<String>,
    #[serde(default)]
    pub markets: Vec<WatchedMarket>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_filter() -> String {
    "zkpredict_engine=info,zkpredict=info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            anyhow::bail!("polling.interval_secs must be positive");
        }
        for market in &self.polling.markets {
            WatchedMarket::new(market.id.clone(), market.outcome_count)
                .with_context(|| format!("Invalid watched market {}", market.id))?;
        }
        self.return_calculator()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn return_config(&self) -> ReturnConfig {
        match self.engine.protocol_fee_bps {
            Some(bps) => ReturnConfig {
                protocol_fee_rate: Decimal::new(i64::from(bps), 4),
            },
            None => ReturnConfig::default(),
        }
    }

    pub fn return_calculator(&self) -> Result<ReturnCalculator> {
        ReturnCalculator::new(self.return_config()).context("Invalid engine.protocol_fee_bps")
    }
}
