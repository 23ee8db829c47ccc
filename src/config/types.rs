//! Configuration types for the stream client
//!
//! `StreamConfig` is what the client reads once at construction.
//! `AppConfig` wraps it together with the feeds the `market-stream` binary
//! should follow, and is what `config.yaml` deserializes into.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::constants;
use crate::core::feed::{socket_base_url, KlineInterval};
use crate::error::AppError;

// ============================================================================
// Configuration Structs
// ============================================================================

/// Connection settings shared by every feed of one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Base API URL (`http(s)://` or `ws(s)://`); sockets live under `/ws/...`
    #[serde(default = "constants::api_url")]
    pub api_url: String,
    /// Fixed wait before each reconnect attempt, in milliseconds
    #[serde(default = "constants::ws_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Consecutive failed attempts before a feed is marked failed
    #[serde(default = "constants::ws_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            reconnect_delay_ms: constants::DEFAULT_RECONNECT_DELAY_MS,
            max_reconnect_attempts: constants::DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl StreamConfig {
    /// Build from environment variables, falling back to defaults
    ///
    /// See `config::constants` for the variable names.
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            api_url: constants::api_url(),
            reconnect_delay_ms: constants::ws_reconnect_delay_ms(),
            max_reconnect_attempts: constants::ws_max_reconnect_attempts(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Base URL with its scheme switched to `ws://` / `wss://`
    pub fn ws_base_url(&self) -> Result<String, AppError> {
        socket_base_url(&self.api_url).ok_or_else(|| {
            AppError::Config(format!(
                "api_url must be an http(s):// or ws(s):// URL with a host (got '{}')",
                self.api_url
            ))
        })
    }

    /// Validate connection settings
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: api_url must map to a socket URL
        self.ws_base_url()?;

        // Rule: at least one attempt, otherwise every close is fatal
        if self.max_reconnect_attempts == 0 {
            return Err(AppError::Config(
                "max_reconnect_attempts must be at least 1".to_string(),
            ));
        }

        // Rule: delay must be bounded (one hour)
        if self.reconnect_delay_ms > 3_600_000 {
            return Err(AppError::Config(format!(
                "reconnect_delay_ms must be <= 3600000, got {}",
                self.reconnect_delay_ms
            )));
        }

        Ok(())
    }
}

/// Feeds followed by the `market-stream` binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Upper-case ticker pair (e.g., "BTCUSDT")
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Candle interval for the kline feed
    #[serde(default)]
    pub interval: KlineInterval,
    /// Follow the price feed
    #[serde(default = "default_true")]
    pub price: bool,
    /// Follow the kline feed
    #[serde(default = "default_true")]
    pub kline: bool,
}

fn default_symbol() -> String {
    constants::DEFAULT_SYMBOL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            interval: KlineInterval::default(),
            price: true,
            kline: true,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config("monitor.symbol cannot be empty".to_string()));
        }

        if !self.price && !self.kline {
            return Err(AppError::Config(
                "monitor must follow at least one feed (price or kline)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Root configuration structure loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), AppError> {
        self.stream.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
