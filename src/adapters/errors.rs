//! Transport error types
//!
//! Socket-level failures are wrapped in `TransportError`. The client never
//! returns these from connect/disconnect calls; they reach the application
//! through the error callback, wrapped in `StreamError::Transport`.

use thiserror::Error;

/// Socket-level error types for transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection to the server could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation requires an open socket
    #[error("Not connected")]
    NotConnected,

    /// Socket has already been closed locally
    #[error("Transport closed")]
    Closed,

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::WebSocket(Box::new(err))
    }
}

/// Result type alias for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let err = TransportError::ConnectionFailed("connection refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(TransportError::NotConnected.to_string(), "Not connected");
    }

    #[test]
    fn test_websocket_error_from_tungstenite() {
        let err: TransportError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, TransportError::WebSocket(_)));
        assert!(err.to_string().starts_with("WebSocket error:"));
    }
}
