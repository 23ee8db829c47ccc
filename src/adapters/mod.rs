//! Socket transports
//!
//! This module provides the transport abstraction the stream client is
//! built on, and the tokio-tungstenite implementation used in production.

pub mod errors;
pub mod traits;
pub mod tungstenite;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use errors::{TransportError, TransportResult};
pub use traits::{EventSink, Transport, TransportEvent, TransportFactory};
pub use tungstenite::{connect_tls, SocketStream, TungsteniteConnector, TungsteniteTransport};
