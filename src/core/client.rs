//! Stream client facade
//!
//! `StreamClient` owns one channel per `FeedKind`. Each channel lives behind
//! its own lock; transport events and retry timers re-enter through a weak
//! handle and are matched against the channel's current transport id or
//! retry token, so anything left over from a replaced or disconnected socket
//! is dropped.
//!
//! Callbacks run after the channel lock is released and may call back into
//! the client.
//!
//! # Example
//! ```ignore
//! let client = StreamClient::from_config(StreamConfig::from_env()?)?;
//! client.on_price_update(|tick| println!("{}", tick));
//! client.connect_price("BTCUSDT");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::adapters::traits::{EventSink, TransportEvent, TransportFactory};
use crate::adapters::tungstenite::TungsteniteConnector;
use crate::config::StreamConfig;
use crate::core::channel::{ChannelConnection, ChannelStatus, CloseOutcome, ConnectionState, RetryToken};
use crate::core::dispatcher::dispatch;
use crate::core::errors::{StreamError, StreamResult};
use crate::core::feed::{FeedKey, FeedKind, KlineInterval};
use crate::core::reconnect::ReconnectPolicy;
use crate::core::subscriptions::{Notice, SubscriptionTable};
use crate::error::{AppError, Result};

type ChannelSlot = Mutex<Option<ChannelConnection>>;

struct Shared {
    ws_base: String,
    policy: ReconnectPolicy,
    factory: Arc<dyn TransportFactory>,
    runtime: Handle,
    subscriptions: SubscriptionTable,
    channels: [ChannelSlot; 2],
    /// Source of transport ids and retry tokens
    ids: AtomicU64,
}

impl Shared {
    fn lock(&self, kind: FeedKind) -> MutexGuard<'_, Option<ChannelConnection>> {
        self.channels[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    /// Sink for the transport opened under id `generation`
    fn event_sink(self: &Arc<Self>, kind: FeedKind, generation: u64) -> EventSink {
        let weak = Arc::downgrade(self);
        EventSink::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_event(kind, generation, event);
            }
        })
    }

    fn handle_event(self: &Arc<Self>, kind: FeedKind, generation: u64, event: TransportEvent) {
        let mut notices = Vec::new();
        {
            let mut slot = self.lock(kind);
            let channel = match slot.as_mut() {
                Some(channel) if channel.accepts(generation) => channel,
                _ => {
                    trace!(feed = %kind, generation, "Dropping event from superseded transport");
                    return;
                }
            };

            match event {
                TransportEvent::Open => {
                    if channel.handle_open() {
                        info!(feed = %channel.feed(), state = %channel.state(), "WebSocket connected");
                        notices.push(Notice::Connected(kind));
                    }
                }
                TransportEvent::Message(raw) => {
                    trace!(feed = %channel.feed(), raw = %raw, "Frame received");
                    channel.record_message();
                    match dispatch(kind, &raw) {
                        Ok(Some(update)) => notices.push(Notice::Update(update)),
                        Ok(None) => debug!(feed = %channel.feed(), "Ignoring message with unknown type"),
                        Err(e) => {
                            warn!(feed = %channel.feed(), error = %e, "Failed to parse message");
                            notices.push(Notice::Error(e));
                        }
                    }
                }
                TransportEvent::Error(source) => {
                    warn!(feed = %channel.feed(), error = %source, "WebSocket error");
                    notices.push(Notice::Error(StreamError::Transport { feed: kind, source }));
                }
                TransportEvent::Close => match channel.handle_close(&self.policy) {
                    CloseOutcome::Retry { attempt, delay } => {
                        let token = RetryToken(self.next_id());
                        let handle = self.spawn_retry(kind, token, delay);
                        channel.arm_retry(token, handle);
                        warn!(
                            feed = %channel.feed(),
                            state = %channel.state(),
                            attempt,
                            max = self.policy.max_attempts,
                            "Attempting to reconnect {} websocket ({}/{})",
                            kind,
                            attempt,
                            self.policy.max_attempts
                        );
                        notices.push(Notice::Disconnected(kind));
                    }
                    CloseOutcome::Failed { attempts } => {
                        error!(
                            feed = %channel.feed(),
                            state = %channel.state(),
                            attempt = attempts,
                            max = self.policy.max_attempts,
                            "Giving up on {} websocket",
                            kind
                        );
                        notices.push(Notice::Disconnected(kind));
                        notices.push(Notice::Error(StreamError::RetriesExhausted {
                            feed: kind,
                            attempts,
                        }));
                    }
                    CloseOutcome::Ignored => {}
                },
            }
        }
        self.subscriptions.notify(notices);
    }

    fn spawn_retry(self: &Arc<Self>, kind: FeedKind, token: RetryToken, delay: Duration) -> JoinHandle<()> {
        let weak: Weak<Shared> = Arc::downgrade(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.on_retry_due(kind, token);
            }
        })
    }

    fn on_retry_due(self: &Arc<Self>, kind: FeedKind, token: RetryToken) {
        let mut slot = self.lock(kind);
        let Some(channel) = slot.as_mut() else {
            return;
        };

        let generation = self.next_id();
        if !channel.begin_retry(token, generation) {
            debug!(feed = %kind, token = token.0, "Stale retry timer ignored");
            return;
        }

        info!(
            feed = %channel.feed(),
            state = %channel.state(),
            attempt = channel.attempts(),
            max = self.policy.max_attempts,
            "Reconnecting websocket"
        );
        let url = channel.feed().url(&self.ws_base);
        let transport = self.factory.open(&url, self.event_sink(kind, generation));
        channel.attach(transport);
    }
}

/// Real-time market data client
///
/// Dropping the client closes every socket and cancels pending retries.
pub struct StreamClient {
    shared: Arc<Shared>,
}

impl StreamClient {
    /// Create a client that opens sockets through `factory`
    ///
    /// Must be called from within a tokio runtime; retry timers are spawned
    /// on it.
    pub fn new(config: StreamConfig, factory: Arc<dyn TransportFactory>) -> Result<Self> {
        config.validate()?;
        let ws_base = config.ws_base_url()?;
        let runtime = Handle::try_current().map_err(|e| {
            AppError::Runtime(format!("StreamClient must be created inside a tokio runtime: {}", e))
        })?;

        Ok(Self {
            shared: Arc::new(Shared {
                ws_base,
                policy: ReconnectPolicy::from_config(&config),
                factory,
                runtime,
                subscriptions: SubscriptionTable::default(),
                channels: Default::default(),
                ids: AtomicU64::new(1),
            }),
        })
    }

    /// Create a client backed by real tokio-tungstenite sockets
    pub fn from_config(config: StreamConfig) -> Result<Self> {
        let connector = TungsteniteConnector::try_current()
            .ok_or_else(|| AppError::Runtime("No tokio runtime available for websocket tasks".to_string()))?;
        Self::new(config, Arc::new(connector))
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Follow the price ticker of `symbol`, replacing any other price feed
    pub fn connect_price(&self, symbol: &str) {
        self.connect(FeedKey::price(symbol));
    }

    /// Follow candles, indicators and signals of `symbol` at `interval`,
    /// replacing any other kline feed
    pub fn connect_kline(&self, symbol: &str, interval: KlineInterval) {
        self.connect(FeedKey::kline(symbol, interval));
    }

    pub fn disconnect_price(&self) {
        self.disconnect(FeedKind::Price);
    }

    pub fn disconnect_kline(&self) {
        self.disconnect(FeedKind::Kline);
    }

    /// Disconnect every feed
    pub fn shutdown(&self) {
        for kind in FeedKind::ALL {
            self.disconnect(kind);
        }
    }

    fn connect(&self, key: FeedKey) {
        let kind = key.kind();
        if key.symbol().trim().is_empty() {
            warn!(feed = %kind, "Rejected connect with empty symbol");
            self.shared
                .subscriptions
                .notify(vec![Notice::Error(StreamError::InvalidFeed {
                    feed: kind,
                    reason: "symbol cannot be empty".to_string(),
                })]);
            return;
        }

        let mut slot = self.shared.lock(kind);
        if slot.as_ref().is_some_and(|channel| channel.is_serving(&key)) {
            debug!(feed = %key, "Already connecting or connected");
            return;
        }

        // Old socket must be closed before the new one opens
        if let Some(mut previous) = slot.take() {
            info!(feed = %previous.feed(), "Closing previous websocket");
            previous.teardown();
        }

        let generation = self.shared.next_id();
        let url = key.url(&self.shared.ws_base);
        info!(feed = %key, url = %url, state = %ConnectionState::Connecting, "Connecting websocket");

        let mut channel = ChannelConnection::new(key, generation);
        let transport = self
            .shared
            .factory
            .open(&url, self.shared.event_sink(kind, generation));
        channel.attach(transport);
        *slot = Some(channel);
    }

    fn disconnect(&self, kind: FeedKind) {
        let mut slot = self.shared.lock(kind);
        if let Some(mut channel) = slot.take() {
            info!(feed = %channel.feed(), state = %ConnectionState::Disconnected, "Disconnecting websocket");
            channel.teardown();
        }
    }

    // =========================================================================
    // Subscriptions (last registration wins)
    // =========================================================================

    pub fn on_price_update<F>(&self, callback: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_price(Arc::new(callback));
    }

    pub fn on_kline_update<F>(&self, callback: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_kline(Arc::new(callback));
    }

    pub fn on_indicator_update<F>(&self, callback: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_indicators(Arc::new(callback));
    }

    pub fn on_signal_update<F>(&self, callback: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_signals(Arc::new(callback));
    }

    /// Fires each time a feed's socket opens, including after a reconnect
    pub fn on_connect<F>(&self, callback: F)
    where
        F: Fn(FeedKind) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_connect(Arc::new(callback));
    }

    /// Fires each time a live socket closes on its own
    pub fn on_disconnect<F>(&self, callback: F)
    where
        F: Fn(FeedKind) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_disconnect(Arc::new(callback));
    }

    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.shared.subscriptions.set_error(Arc::new(callback));
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// True if at least one feed is connected
    pub fn is_connected(&self) -> bool {
        FeedKind::ALL
            .into_iter()
            .any(|kind| self.state(kind) == ConnectionState::Connected)
    }

    pub fn state(&self, kind: FeedKind) -> ConnectionState {
        self.shared
            .lock(kind)
            .as_ref()
            .map_or(ConnectionState::Disconnected, ChannelConnection::state)
    }

    pub fn status(&self, kind: FeedKind) -> Option<ChannelStatus> {
        self.shared.lock(kind).as_ref().map(ChannelConnection::status)
    }

    /// Send a text frame on a connected feed
    pub fn send(&self, kind: FeedKind, text: &str) -> StreamResult<()> {
        let mut slot = self.shared.lock(kind);
        let transport = slot
            .as_mut()
            .filter(|channel| channel.state() == ConnectionState::Connected)
            .and_then(|channel| channel.transport_mut())
            .ok_or(StreamError::NotConnected { feed: kind })?;
        transport
            .send(text)
            .map_err(|source| StreamError::Transport { feed: kind, source })
    }
}

impl fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamClient")
            .field("ws_base", &self.shared.ws_base)
            .field("policy", &self.shared.policy)
            .field("price", &self.state(FeedKind::Price))
            .field("kline", &self.state(FeedKind::Kline))
            .finish()
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Tests
// =============================================================================
