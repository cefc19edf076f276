// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Broadcast of lambda log entries to any number of subscribers.
//!
//! Every subscriber owns an unbounded queue, so publishing never blocks and a
//! slow subscriber never loses entries or holds up the others. Entries published
//! by one producer reach every subscriber in publication order.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::model::ComputeLogEntry;

#[derive(Default)]
struct Subscribers {
    senders: Vec<UnboundedSender<ComputeLogEntry>>,
    closed: bool,
}

/// Publishing side of the log stream. Cheap to clone.
#[derive(Clone, Default)]
pub struct LogHub {
    inner: Arc<Mutex<Subscribers>>,
}

impl LogHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts observing entries published from now on.
    pub fn subscribe(&self) -> LogSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut subscribers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !subscribers.closed {
            subscribers.senders.push(sender);
        }
        LogSubscription { receiver }
    }

    /// Delivers `entry` to every live subscriber, dropping the ones that went away.
    pub fn publish(&self, entry: ComputeLogEntry) {
        let mut subscribers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers
            .senders
            .retain(|sender| sender.send(entry.clone()).is_ok());
    }

    /// Ends every subscription. Later subscriptions end immediately.
    pub fn close(&self) {
        let mut subscribers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.closed = true;
        subscribers.senders.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }
}

/// Receiving side of the log stream. Dropping it unsubscribes.
pub struct LogSubscription {
    receiver: UnboundedReceiver<ComputeLogEntry>,
}

impl LogSubscription {
    /// Waits for the next entry; `None` once the hub is closed and drained.
    pub async fn recv(&mut self) -> Option<ComputeLogEntry> {
        self.receiver.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for synchronous callers.
    /// Must not be called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<ComputeLogEntry> {
        self.receiver.blocking_recv()
    }

    /// Next entry if one is already queued.
    pub fn try_recv(&mut self) -> Option<ComputeLogEntry> {
        match self.receiver.try_recv() {
            Ok(entry) => Some(entry),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Removes and returns every queued entry.
    pub fn drain(&mut self) -> Vec<ComputeLogEntry> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
