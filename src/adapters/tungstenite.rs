//! WebSocket transport backed by tokio-tungstenite
//!
//! Each opened socket runs in its own background task which owns the
//! stream. The `TungsteniteTransport` handle only holds an outbound queue and
//! a cancellation token, so `send` and `close` never block.

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::protocol::Message, Connector, MaybeTlsStream,
    WebSocketStream,
};
use tokio_util::sync::CancellationToken;

use crate::adapters::errors::{TransportError, TransportResult};
use crate::adapters::traits::{EventSink, Transport, TransportFactory};

/// Opens real WebSocket connections on a tokio runtime
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    runtime: Handle,
}

impl TungsteniteConnector {
    /// Create a connector that spawns socket tasks on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Create a connector bound to the runtime of the calling task
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl TransportFactory for TungsteniteConnector {
    fn open(&self, url: &str, sink: EventSink) -> Box<dyn Transport> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        self.runtime.spawn(socket_task(
            url.to_string(),
            sink,
            outbound_rx,
            cancel.clone(),
        ));

        Box::new(TungsteniteTransport {
            outbound: outbound_tx,
            cancel,
        })
    }
}

/// Handle to a socket owned by a background task
#[derive(Debug)]
pub struct TungsteniteTransport {
    outbound: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
}

impl Transport for TungsteniteTransport {
    fn send(&mut self, msg: &str) -> TransportResult<()> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(Message::Text(msg.to_string()))
            .map_err(|_| TransportError::NotConnected)
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for TungsteniteTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// WebSocket stream over plain TCP or TLS, depending on the URL scheme
pub type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// TLS settings shared by every socket (TLSv1.2 minimum)
fn tls_connector() -> TransportResult<native_tls::TlsConnector> {
    native_tls::TlsConnector::builder()
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map_err(|e| TransportError::ConnectionFailed(format!("TLS error: {}", e)))
}

/// Open a WebSocket to `url`; `wss://` URLs negotiate TLSv1.2 or newer
pub async fn connect_tls(url: &str) -> TransportResult<SocketStream> {
    let tls = tls_connector()?;

    let (ws_stream, _response) =
        connect_async_tls_with_config(url, None, false, Some(Connector::NativeTls(tls)))
            .await
            .map_err(|e| TransportError::WebSocket(Box::new(e)))?;

    Ok(ws_stream)
}

/// Background socket task
///
/// Emits `Open` once the handshake completes, one `Message` per text (or
/// UTF-8 binary) frame, `Error` on failures, and always finishes with a
/// single `Close`.
async fn socket_task(
    url: String,
    sink: EventSink,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    tracing::debug!(url = %url, "Opening WebSocket");

    let connect_result = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(url = %url, "WebSocket closed before handshake completed");
            sink.close();
            return;
        }
        result = connect_tls(&url) => result,
    };

    let ws_stream = match connect_result {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "WebSocket connection failed");
            sink.error(e);
            sink.close();
            return;
        }
    };

    tracing::info!(url = %url, "WebSocket connected");
    sink.open();

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                tracing::debug!(url = %url, "WebSocket closed locally");
                break;
            }
            Some(msg) = outbound.recv() => {
                if let Err(e) = write.send(msg).await {
                    tracing::warn!(url = %url, error = %e, "WebSocket send failed");
                    sink.error(TransportError::from(e));
                    break;
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        tracing::trace!("Raw WS message: {}", text);
                        sink.message(text);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Some servers send JSON as binary frames
                        match String::from_utf8(data) {
                            Ok(text) => sink.message(text),
                            Err(e) => {
                                tracing::debug!("Binary message not UTF-8: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(url = %url, frame = ?frame, "WebSocket closed by server");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                        tracing::trace!("Control frame received");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(url = %url, error = %e, "WebSocket error");
                        sink.error(TransportError::from(e));
                        break;
                    }
                    None => {
                        tracing::info!(url = %url, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    sink.close();
}
