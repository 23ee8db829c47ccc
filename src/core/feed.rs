//! Feed identities and wire addressing
//!
//! A feed is one logical stream: the price ticker for a symbol, or the
//! multiplexed kline/indicator/signal stream for a symbol at an interval.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which of the two channels a feed runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Price,
    Kline,
}

impl FeedKind {
    pub const ALL: [FeedKind; 2] = [FeedKind::Price, FeedKind::Kline];

    /// Stable slot index, used to address per-channel storage
    pub(crate) fn index(self) -> usize {
        match self {
            FeedKind::Price => 0,
            FeedKind::Kline => 1,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Price => write!(f, "price"),
            FeedKind::Kline => write!(f, "kline"),
        }
    }
}

/// Candle interval accepted by the kline feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    #[default]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl KlineInterval {
    pub const ALL: [KlineInterval; 8] = [
        KlineInterval::OneMinute,
        KlineInterval::FiveMinutes,
        KlineInterval::FifteenMinutes,
        KlineInterval::ThirtyMinutes,
        KlineInterval::OneHour,
        KlineInterval::FourHours,
        KlineInterval::OneDay,
        KlineInterval::OneWeek,
    ];

    /// Wire representation (`1m` … `1w`)
    pub fn as_str(self) -> &'static str {
        match self {
            KlineInterval::OneMinute => "1m",
            KlineInterval::FiveMinutes => "5m",
            KlineInterval::FifteenMinutes => "15m",
            KlineInterval::ThirtyMinutes => "30m",
            KlineInterval::OneHour => "1h",
            KlineInterval::FourHours => "4h",
            KlineInterval::OneDay => "1d",
            KlineInterval::OneWeek => "1w",
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown interval string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown kline interval '{0}' (expected one of 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w)")]
pub struct ParseIntervalError(pub String);

impl FromStr for KlineInterval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KlineInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| ParseIntervalError(s.to_string()))
    }
}

/// Identity of one logical feed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKey {
    Price { symbol: String },
    Kline { symbol: String, interval: KlineInterval },
}

impl FeedKey {
    pub fn price(symbol: impl Into<String>) -> Self {
        FeedKey::Price {
            symbol: symbol.into(),
        }
    }

    pub fn kline(symbol: impl Into<String>, interval: KlineInterval) -> Self {
        FeedKey::Kline {
            symbol: symbol.into(),
            interval,
        }
    }

    pub fn kind(&self) -> FeedKind {
        match self {
            FeedKey::Price { .. } => FeedKind::Price,
            FeedKey::Kline { .. } => FeedKind::Kline,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            FeedKey::Price { symbol } | FeedKey::Kline { symbol, .. } => symbol,
        }
    }

    /// Full socket URL for this feed under `ws_base` (e.g. `ws://host:8000`)
    pub fn url(&self, ws_base: &str) -> String {
        let base = ws_base.trim_end_matches('/');
        match self {
            FeedKey::Price { symbol } => format!("{}/ws/price/{}", base, symbol),
            FeedKey::Kline { symbol, interval } => {
                format!("{}/ws/kline/{}?interval={}", base, symbol, interval)
            }
        }
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKey::Price { symbol } => write!(f, "price:{}", symbol),
            FeedKey::Kline { symbol, interval } => write!(f, "kline:{}@{}", symbol, interval),
        }
    }
}

/// Rewrite an HTTP(S) base URL to its socket scheme
///
/// `http://` becomes `ws://`, `https://` becomes `wss://`; socket schemes are
/// kept as-is. Returns `None` for anything else.
pub fn socket_base_url(api_url: &str) -> Option<String> {
    let trimmed = api_url.trim().trim_end_matches('/');
    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        ("wss://", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        ("ws://", rest)
    } else if let Some(rest) = trimmed.strip_prefix("wss://") {
        ("wss://", rest)
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        ("ws://", rest)
    } else {
        return None;
    };

    if rest.is_empty() {
        return None;
    }
    Some(format!("{}{}", scheme, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_url() {
        let key = FeedKey::price("BTCUSDT");
        assert_eq!(key.url("ws://localhost:8000"), "ws://localhost:8000/ws/price/BTCUSDT");
    }

    #[test]
    fn test_kline_url_trims_trailing_slash() {
        let key = FeedKey::kline("ETHUSDT", KlineInterval::FourHours);
        assert_eq!(
            key.url("wss://api.example.com/"),
            "wss://api.example.com/ws/kline/ETHUSDT?interval=4h"
        );
    }

    #[test]
    fn test_socket_base_url_schemes() {
        assert_eq!(socket_base_url("http://localhost:8000").as_deref(), Some("ws://localhost:8000"));
        assert_eq!(socket_base_url("https://api.example.com/").as_deref(), Some("wss://api.example.com"));
        assert_eq!(socket_base_url("wss://stream.example.com").as_deref(), Some("wss://stream.example.com"));
        assert_eq!(socket_base_url("ftp://example.com"), None);
        assert_eq!(socket_base_url("http://"), None);
    }

    #[test]
    fn test_interval_round_trip_all() {
        for interval in KlineInterval::ALL {
            assert_eq!(interval.as_str().parse::<KlineInterval>().unwrap(), interval);
        }
    }

    #[test]
    fn test_interval_rejects_unknown() {
        let err = "2h".parse::<KlineInterval>().unwrap_err();
        assert!(err.to_string().contains("'2h'"));
        // Intervals are case-sensitive on the wire: 1M would be a month upstream
        assert!("1M".parse::<KlineInterval>().is_err());
    }

    #[test]
    fn test_interval_serde_uses_wire_names() {
        let json = serde_json::to_string(&KlineInterval::FifteenMinutes).unwrap();
        assert_eq!(json, "\"15m\"");
        let parsed: KlineInterval = serde_json::from_str("\"1w\"").unwrap();
        assert_eq!(parsed, KlineInterval::OneWeek);
    }

    #[test]
    fn test_feed_key_display_and_kind() {
        let price = FeedKey::price("BTCUSDT");
        let kline = FeedKey::kline("BTCUSDT", KlineInterval::OneHour);
        assert_eq!(price.to_string(), "price:BTCUSDT");
        assert_eq!(kline.to_string(), "kline:BTCUSDT@1h");
        assert_eq!(price.kind(), FeedKind::Price);
        assert_eq!(kline.kind(), FeedKind::Kline);
        assert_eq!(kline.symbol(), "BTCUSDT");
    }
}
