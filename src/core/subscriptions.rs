//! Callback slots
//!
//! One slot per message kind; registering again replaces the previous
//! callback. Callbacks are cloned out of the table and invoked with no lock
//! held, so they are free to call back into the client.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::core::dispatcher::Update;
use crate::core::errors::StreamError;
use crate::core::feed::FeedKind;

pub type UpdateCallback = Arc<dyn Fn(Value) + Send + Sync>;
pub type FeedCallback = Arc<dyn Fn(FeedKind) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&StreamError) + Send + Sync>;

/// Something the application should hear about
#[derive(Debug)]
pub(crate) enum Notice {
    Connected(FeedKind),
    Disconnected(FeedKind),
    Update(Update),
    Error(StreamError),
}

#[derive(Default)]
struct Slots {
    price: Option<UpdateCallback>,
    kline: Option<UpdateCallback>,
    indicators: Option<UpdateCallback>,
    signals: Option<UpdateCallback>,
    connect: Option<FeedCallback>,
    disconnect: Option<FeedCallback>,
    error: Option<ErrorCallback>,
}

#[derive(Default)]
pub(crate) struct SubscriptionTable {
    slots: Mutex<Slots>,
}

impl SubscriptionTable {
    fn with_slots<R>(&self, f: impl FnOnce(&mut Slots) -> R) -> R {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots)
    }

    pub fn set_price(&self, callback: UpdateCallback) {
        self.with_slots(|s| s.price = Some(callback));
    }

    pub fn set_kline(&self, callback: UpdateCallback) {
        self.with_slots(|s| s.kline = Some(callback));
    }

    pub fn set_indicators(&self, callback: UpdateCallback) {
        self.with_slots(|s| s.indicators = Some(callback));
    }

    pub fn set_signals(&self, callback: UpdateCallback) {
        self.with_slots(|s| s.signals = Some(callback));
    }

    pub fn set_connect(&self, callback: FeedCallback) {
        self.with_slots(|s| s.connect = Some(callback));
    }

    pub fn set_disconnect(&self, callback: FeedCallback) {
        self.with_slots(|s| s.disconnect = Some(callback));
    }

    pub fn set_error(&self, callback: ErrorCallback) {
        self.with_slots(|s| s.error = Some(callback));
    }

    /// Deliver notices in order. Empty slots swallow their notice.
    pub fn notify(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Connected(feed) => {
                    if let Some(cb) = self.with_slots(|s| s.connect.clone()) {
                        cb(feed);
                    }
                }
                Notice::Disconnected(feed) => {
                    if let Some(cb) = self.with_slots(|s| s.disconnect.clone()) {
                        cb(feed);
                    }
                }
                Notice::Error(err) => {
                    if let Some(cb) = self.with_slots(|s| s.error.clone()) {
                        cb(&err);
                    }
                }
                Notice::Update(update) => {
                    let (slot, data) = match update {
                        Update::Price(data) => (self.with_slots(|s| s.price.clone()), data),
                        Update::Kline(data) => (self.with_slots(|s| s.kline.clone()), data),
                        Update::Indicators(data) => {
                            (self.with_slots(|s| s.indicators.clone()), data)
                        }
                        Update::Signals(data) => (self.with_slots(|s| s.signals.clone()), data),
                    };
                    if let Some(cb) = slot {
                        cb(data);
                    }
                }
            }
        }
    }
}
