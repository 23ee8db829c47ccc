//! Transport trait definitions
//!
//! A `Transport` is one bidirectional message socket. It is created by a
//! `TransportFactory`, which is handed an `EventSink` to report what happens
//! on the socket afterwards.
//!
//! # Event contract
//!
//! Every opened transport reports at most one `Open`, then exactly one
//! `Close`, with zero or more `Error`s and `Message`s in between. An
//! unreachable host shows up as `Error` followed by `Close`. Events may be
//! delivered from any thread, but never synchronously from inside
//! `TransportFactory::open` or `Transport::close`: the client holds the
//! channel lock across those calls.

use std::fmt;
use std::sync::Arc;

use crate::adapters::errors::{TransportError, TransportResult};

/// Something that happened on a transport
#[derive(Debug)]
pub enum TransportEvent {
    /// The socket finished its handshake
    Open,
    /// A text frame was received
    Message(String),
    /// The socket is gone; no further events follow
    Close,
    /// Socket-level failure; a `Close` always follows eventually
    Error(TransportError),
}

/// Callback half of a transport: where the socket reports its events
///
/// Cheap to clone; every clone reports to the same receiver.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(TransportEvent) + Send + Sync>,
}

impl EventSink {
    /// Create a sink that forwards every event to `deliver`
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Report an arbitrary event
    pub fn emit(&self, event: TransportEvent) {
        (self.deliver)(event);
    }

    pub fn open(&self) {
        self.emit(TransportEvent::Open);
    }

    pub fn message(&self, raw: impl Into<String>) {
        self.emit(TransportEvent::Message(raw.into()));
    }

    pub fn error(&self, err: TransportError) {
        self.emit(TransportEvent::Error(err));
    }

    pub fn close(&self) {
        self.emit(TransportEvent::Close);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// Command half of an open socket
pub trait Transport: Send {
    /// Queue a text frame for sending
    fn send(&mut self, msg: &str) -> TransportResult<()>;

    /// Close the socket. Idempotent.
    fn close(&mut self);
}

/// Opens transports
///
/// Injected into the client at construction, so tests can swap in a fake.
pub trait TransportFactory: Send + Sync {
    /// Start opening a socket to `url`
    ///
    /// Must return immediately. Success or failure is reported through
    /// `sink` as described in the module docs.
    fn open(&self, url: &str, sink: EventSink) -> Box<dyn Transport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_event_sink_forwards_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = EventSink::new(move |event| {
            let label = match event {
                TransportEvent::Open => "open".to_string(),
                TransportEvent::Message(text) => format!("message:{}", text),
                TransportEvent::Close => "close".to_string(),
                TransportEvent::Error(e) => format!("error:{}", e),
            };
            seen_clone.lock().unwrap().push(label);
        });

        sink.open();
        sink.message("{\"a\":1}");
        sink.error(TransportError::ConnectionFailed("reset".into()));
        sink.close();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "open",
                "message:{\"a\":1}",
                "error:Connection failed: reset",
                "close",
            ]
        );
    }

    #[test]
    fn test_event_sink_clones_share_receiver() {
        let count = Arc::new(Mutex::new(0));
        let count_clone = Arc::clone(&count);
        let sink = EventSink::new(move |_| *count_clone.lock().unwrap() += 1);
        let other = sink.clone();

        sink.open();
        other.close();

        assert_eq!(*count.lock().unwrap(), 2);
    }
}
