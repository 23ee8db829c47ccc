//! Core module - feed identities, reconnect policy, channel state machine,
//! message dispatch and the client facade
//!
//! This module uses **explicit re-exports** instead of glob exports
//! (`pub use module::*`) so the public API only changes on purpose.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use market_stream::core::{FeedKind, KlineInterval, StreamClient};
//! ```

pub mod channel;
pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod feed;
pub mod reconnect;
mod subscriptions;

// Explicit re-exports for feed module
pub use feed::{socket_base_url, FeedKey, FeedKind, KlineInterval, ParseIntervalError};

// Explicit re-exports for reconnect module
pub use reconnect::{ReconnectPolicy, RetryDecision};

// Explicit re-exports for channel module
pub use channel::{ChannelConnection, ChannelStatus, ConnectionState, RetryToken};

// Explicit re-exports for dispatcher module
pub use dispatcher::{dispatch, Update};

// Explicit re-exports for errors module
pub use errors::{StreamError, StreamResult};

// Explicit re-exports for client module
pub use client::StreamClient;

pub use subscriptions::{ErrorCallback, FeedCallback, UpdateCallback};
