// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-emission of persisted events to downstream listeners.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use barnacles_core::StoredEvent;

/// Fans persisted events out to every subscriber.
///
/// Each subscriber owns an unbounded channel, so a slow listener delays only
/// itself and never misses an event. Emitting with no subscribers is not an
/// error: the event is simply not delivered. A subscriber whose receiver has
/// been dropped is forgotten on the next emit. Every receiver closes once the
/// last clone of the emitter is dropped.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<StoredEvent>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It sees events emitted after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoredEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    /// Deliver `stored` to every current subscriber. Returns how many received it.
    pub fn emit(&self, stored: StoredEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(stored.clone()).is_ok());
        subscribers.len()
    }
}
