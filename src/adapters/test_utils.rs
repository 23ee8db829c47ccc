//! Shared test utilities for transport testing
//!
//! `FakeConnector` records every socket the client opens and hands tests a
//! `FakeSocket` to drive it: inject `Open`/`Message`/`Close`/`Error`, and
//! inspect frames sent and whether the client closed it.

use std::sync::{Arc, Mutex};

use crate::adapters::errors::{TransportError, TransportResult};
use crate::adapters::traits::{EventSink, Transport, TransportFactory};

#[derive(Debug, Default)]
struct SocketState {
    closed: bool,
    sent: Vec<String>,
}

/// Test-side view of one opened fake socket
#[derive(Debug, Clone)]
pub struct FakeSocket {
    pub url: String,
    sink: EventSink,
    state: Arc<Mutex<SocketState>>,
}

impl FakeSocket {
    pub fn open(&self) {
        self.sink.open();
    }

    pub fn message(&self, raw: &str) {
        self.sink.message(raw);
    }

    pub fn error(&self, reason: &str) {
        self.sink.error(TransportError::ConnectionFailed(reason.to_string()));
    }

    pub fn close(&self) {
        self.sink.close();
    }

    /// Error followed by close, the way an unreachable host behaves
    pub fn fail(&self, reason: &str) {
        self.error(reason);
        self.close();
    }

    /// Whether the client called `close()` on this socket
    pub fn is_closed_by_client(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }
}

struct FakeTransport {
    state: Arc<Mutex<SocketState>>,
}

impl Transport for FakeTransport {
    fn send(&mut self, msg: &str) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.sent.push(msg.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}

/// Transport factory that never touches the network
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_count(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    /// Most recently opened socket whose URL contains `fragment`
    pub fn last_matching(&self, fragment: &str) -> FakeSocket {
        self.sockets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.url.contains(fragment))
            .cloned()
            .unwrap_or_else(|| panic!("no socket opened for {}", fragment))
    }

    /// Sockets the client has not closed
    pub fn live_count(&self, fragment: &str) -> usize {
        self.sockets
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.url.contains(fragment) && !s.is_closed_by_client())
            .count()
    }
}

impl TransportFactory for FakeConnector {
    fn open(&self, url: &str, sink: EventSink) -> Box<dyn Transport> {
        let state = Arc::new(Mutex::new(SocketState::default()));
        self.sockets.lock().unwrap().push(FakeSocket {
            url: url.to_string(),
            sink,
            state: Arc::clone(&state),
        });
        Box::new(FakeTransport { state })
    }
}
