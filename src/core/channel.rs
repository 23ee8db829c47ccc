//! Per-feed connection state machine
//!
//! A `ChannelConnection` owns everything belonging to one live feed: its
//! transport, its attempt counter and its pending retry timer. It does no
//! I/O scheduling itself; the client drives it from transport events and
//! timer firings and acts on the returned outcomes.
//!
//! ```text
//!  connect ──► Connecting ──Open──► Connected
//!                 ▲  │                  │
//!          retry  │  └──────Close───────┤
//!          fires  │                     ▼
//!             Reconnecting ◄── budget left? ──no──► Failed
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::adapters::traits::Transport;
use crate::core::feed::FeedKey;
use crate::core::reconnect::{ReconnectPolicy, RetryDecision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    /// Whether a transport is (or is about to be) live in this state
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Identity of one scheduled reconnect timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryToken(pub u64);

/// The single reconnect timer a channel may own
#[derive(Debug)]
pub(crate) struct PendingRetry {
    token: RetryToken,
    handle: JoinHandle<()>,
}

impl PendingRetry {
    fn cancel(self) {
        self.handle.abort();
    }
}

/// Point-in-time view of a channel, safe to hand out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStatus {
    #[serde(serialize_with = "serialize_feed")]
    pub feed: FeedKey,
    pub state: ConnectionState,
    pub attempts: u32,
    pub connected_since: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

fn serialize_feed<S: serde::Serializer>(feed: &FeedKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(feed)
}

/// What a close of the live transport led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    /// Channel is `Reconnecting`; the caller must arm a retry timer
    Retry { attempt: u32, delay: std::time::Duration },
    /// Channel is `Failed`
    Failed { attempts: u32 },
    /// Close arrived in a state with no live transport
    Ignored,
}

pub struct ChannelConnection {
    feed: FeedKey,
    state: ConnectionState,
    attempts: u32,
    /// Id of the transport whose events this channel currently accepts
    generation: u64,
    transport: Option<Box<dyn Transport>>,
    pending_retry: Option<PendingRetry>,
    connected_since: Option<DateTime<Utc>>,
    last_message_at: Option<DateTime<Utc>>,
}

impl ChannelConnection {
    /// New channel in `Connecting`, bound to transport id `generation`
    pub fn new(feed: FeedKey, generation: u64) -> Self {
        Self {
            feed,
            state: ConnectionState::Connecting,
            attempts: 0,
            generation,
            transport: None,
            pending_retry: None,
            connected_since: None,
            last_message_at: None,
        }
    }

    pub fn feed(&self) -> &FeedKey {
        &self.feed
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether an event from transport `generation` belongs to this channel
    pub fn accepts(&self, generation: u64) -> bool {
        self.generation == generation && self.state.is_active()
    }

    /// Same feed, and already connecting or connected
    pub fn is_serving(&self, feed: &FeedKey) -> bool {
        &self.feed == feed && self.state.is_active()
    }

    /// Bind the transport opened for the current generation
    pub fn attach(&mut self, transport: Box<dyn Transport>) {
        if let Some(mut previous) = self.transport.replace(transport) {
            previous.close();
        }
    }

    pub fn transport_mut(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }

    /// `Connecting → Connected`. Returns false if the open was not expected.
    pub fn handle_open(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.connected_since = Some(Utc::now());
        true
    }

    pub fn record_message(&mut self) {
        self.last_message_at = Some(Utc::now());
    }

    /// Live transport closed: consume one attempt and move to `Reconnecting`
    /// or `Failed`
    pub(crate) fn handle_close(&mut self, policy: &ReconnectPolicy) -> CloseOutcome {
        if !self.state.is_active() {
            return CloseOutcome::Ignored;
        }

        // Remote side is already gone; release our handle too
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.connected_since = None;

        match policy.on_close(self.attempts) {
            RetryDecision::Retry { attempt, delay } => {
                self.attempts = attempt;
                self.state = ConnectionState::Reconnecting;
                CloseOutcome::Retry { attempt, delay }
            }
            RetryDecision::GiveUp { attempts } => {
                self.attempts = attempts;
                self.state = ConnectionState::Failed;
                CloseOutcome::Failed { attempts }
            }
        }
    }

    /// Record the timer armed after `CloseOutcome::Retry`
    ///
    /// Any previously armed timer is cancelled first.
    pub(crate) fn arm_retry(&mut self, token: RetryToken, handle: JoinHandle<()>) {
        if let Some(previous) = self.pending_retry.replace(PendingRetry { token, handle }) {
            previous.cancel();
        }
    }

    /// Timer `token` fired. If it is still the armed one, move to
    /// `Connecting` under the new transport id and return true.
    pub fn begin_retry(&mut self, token: RetryToken, generation: u64) -> bool {
        let is_current = self
            .pending_retry
            .as_ref()
            .is_some_and(|pending| pending.token == token);
        if !is_current || self.state != ConnectionState::Reconnecting {
            return false;
        }

        // The timer task is the caller; its handle is finished, just drop it
        self.pending_retry = None;
        self.generation = generation;
        self.state = ConnectionState::Connecting;
        true
    }

    /// Close the transport, cancel the timer, and end in `Disconnected`
    pub fn teardown(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        if let Some(pending) = self.pending_retry.take() {
            pending.cancel();
        }
        self.state = ConnectionState::Disconnected;
        self.connected_since = None;
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            feed: self.feed.clone(),
            state: self.state,
            attempts: self.attempts,
            connected_since: self.connected_since,
            last_message_at: self.last_message_at,
        }
    }
}

impl fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("feed", &self.feed)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("generation", &self.generation)
            .field("has_transport", &self.transport.is_some())
            .field("pending_retry", &self.pending_retry.as_ref().map(|p| p.token))
            .finish()
    }
}

impl Drop for ChannelConnection {
    fn drop(&mut self) {
        self.teardown();
    }
}
