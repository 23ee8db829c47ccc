//! Market data stream client
//!
//! Follows a price ticker feed and a multiplexed kline feed (candles,
//! indicators, signals) over WebSockets, with a fixed-delay reconnect policy
//! per feed and callback-based delivery.
//!
//! - `adapters`: socket transports (tokio-tungstenite, plus a fake in tests)
//! - `core`: feeds, reconnect policy, channel state machine, dispatch, client
//! - `config`: env/YAML configuration and logging setup

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use crate::core::{FeedKind, KlineInterval, StreamClient, StreamError};
pub use error::AppError;
