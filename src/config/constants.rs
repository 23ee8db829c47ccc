//! Application-wide constants and configuration defaults
//!
//! Stream settings are read once, when a `StreamConfig` is built. Values can
//! be overridden via environment variables.

use std::time::Duration;

use crate::core::feed::KlineInterval;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: KlineInterval = KlineInterval::OneHour;

// =============================================================================
// Endpoint
// =============================================================================

/// Base API URL (default: `http://localhost:8000`)
///
/// Environment variable: `API_URL`
pub fn api_url() -> String {
    std::env::var("API_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

// =============================================================================
// Reconnect Policy
// =============================================================================

/// Wait before each reconnect attempt in milliseconds (default: 5000ms)
///
/// Environment variable: `WS_RECONNECT_DELAY_MS`
pub fn ws_reconnect_delay_ms() -> u64 {
    std::env::var("WS_RECONNECT_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RECONNECT_DELAY_MS)
}

pub fn ws_reconnect_delay() -> Duration {
    Duration::from_millis(ws_reconnect_delay_ms())
}

/// Consecutive failed attempts before a feed gives up (default: 5)
///
/// Environment variable: `WS_MAX_RECONNECT_ATTEMPTS`
pub fn ws_max_reconnect_attempts() -> u32 {
    std::env::var("WS_MAX_RECONNECT_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_RECONNECT_ATTEMPTS)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for debugging/startup logs)
pub fn log_configuration() {
    tracing::info!("=== Stream Configuration ===");
    tracing::info!("  - API URL: {}", api_url());
    tracing::info!("  - Reconnect delay: {:?}", ws_reconnect_delay());
    tracing::info!("  - Max reconnect attempts: {}", ws_max_reconnect_attempts());
    tracing::info!("  - Default feed: {} @ {}", DEFAULT_SYMBOL, DEFAULT_INTERVAL);
    tracing::info!("============================");
}
