//! Errors reported through the client's error callback
//!
//! Every variant names the feed it concerns so a single callback can serve
//! both channels.

use thiserror::Error;

use crate::adapters::errors::TransportError;
use crate::core::feed::FeedKind;

#[derive(Error, Debug)]
pub enum StreamError {
    /// Payload was not valid JSON. The connection stays up.
    #[error("Invalid JSON on {feed} feed: {source}")]
    Parse {
        feed: FeedKind,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON on the kline feed without a usable `{type, data}` envelope
    #[error("Malformed kline envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// Socket-level failure; a close (and reconnect decision) follows
    #[error("Transport error on {feed} feed: {source}")]
    Transport {
        feed: FeedKind,
        #[source]
        source: TransportError,
    },

    /// Reconnect budget used up; the feed is `Failed` until connected again
    #[error("Maximum reconnect attempts ({attempts}) reached for {feed} websocket")]
    RetriesExhausted { feed: FeedKind, attempts: u32 },

    /// Feed parameters rejected before any socket was opened
    #[error("Invalid {feed} feed: {reason}")]
    InvalidFeed { feed: FeedKind, reason: String },

    /// Operation needs a live socket on this feed
    #[error("No live {feed} connection")]
    NotConnected { feed: FeedKind },
}

impl StreamError {
    /// The feed this error concerns
    pub fn feed(&self) -> FeedKind {
        match self {
            StreamError::Parse { feed, .. }
            | StreamError::Transport { feed, .. }
            | StreamError::RetriesExhausted { feed, .. }
            | StreamError::InvalidFeed { feed, .. }
            | StreamError::NotConnected { feed } => *feed,
            StreamError::MalformedEnvelope { .. } => FeedKind::Kline,
        }
    }

    /// True when the feed stopped and needs an explicit connect to recover
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StreamError::RetriesExhausted { .. } | StreamError::InvalidFeed { .. }
        )
    }
}

/// Result type alias for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_names_feed() {
        let err = StreamError::RetriesExhausted {
            feed: FeedKind::Price,
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "Maximum reconnect attempts (5) reached for price websocket"
        );
        assert_eq!(err.feed(), FeedKind::Price);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_error_is_not_fatal() {
        let source = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let err = StreamError::Parse {
            feed: FeedKind::Kline,
            source,
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().starts_with("Invalid JSON on kline feed"));
    }

    #[test]
    fn test_malformed_envelope_belongs_to_kline() {
        let err = StreamError::MalformedEnvelope {
            reason: "missing 'type'".into(),
        };
        assert_eq!(err.feed(), FeedKind::Kline);
    }

    #[test]
    fn test_transport_error_keeps_source() {
        use std::error::Error as _;
        let err = StreamError::Transport {
            feed: FeedKind::Kline,
            source: TransportError::ConnectionFailed("refused".into()),
        };
        assert!(err.source().is_some());
        assert!(!err.is_fatal());
    }
}
