// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out message broker
//!
//! Every subscriber owns a bounded queue. `send` never waits: a subscriber
//! without room misses the message and the caller hears about it.

use crate::error::ChannelError;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};

struct Subscribers<M> {
    senders: Vec<mpsc::Sender<M>>,
    closed: bool,
}

/// Delivers each message to every current subscriber
///
/// Clones share subscribers.
pub struct Broker<M> {
    subscribers: Arc<RwLock<Subscribers<M>>>,
}

impl<M> Clone for Broker<M> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<M> Default for Broker<M> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Subscribers {
                senders: Vec::new(),
                closed: false,
            })),
        }
    }
}

impl<M: Clone + Send + 'static> Broker<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber whose queue holds up to `capacity` messages
    pub fn subscribe(&self, capacity: usize) -> Result<mpsc::Receiver<M>, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if subscribers.closed {
            return Err(ChannelError::Closed);
        }
        let (tx, rx) = mpsc::channel(capacity);
        subscribers.senders.push(tx);
        Ok(rx)
    }

    /// Offer `msg` to every subscriber without waiting
    ///
    /// Subscribers whose receiver was dropped are forgotten.
    pub fn send(&self, msg: M) -> Result<(), ChannelError> {
        let (missed, gone) = {
            let subscribers = self
                .subscribers
                .read()
                .unwrap_or_else(|e| e.into_inner());
            if subscribers.closed {
                return Err(ChannelError::Closed);
            }
            let mut missed = 0;
            let mut gone = 0;
            for tx in &subscribers.senders {
                match tx.try_send(msg.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => missed += 1,
                    Err(TrySendError::Closed(_)) => gone += 1,
                }
            }
            (missed, gone)
        };

        if gone > 0 {
            self.subscribers
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .senders
                .retain(|tx| !tx.is_closed());
            tracing::debug!(gone, "dropped departed subscribers");
        }
        if missed > 0 {
            tracing::warn!(missed, "subscriber queue full, message dropped");
            return Err(ChannelError::Full { missed });
        }
        Ok(())
    }

    /// Number of registered subscribers
    pub fn subscribers(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .senders
            .len()
    }

    /// End every subscription
    ///
    /// Receivers still drain what is queued, then see the end of the stream.
    pub fn close(&self) -> Result<(), ChannelError> {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if subscribers.closed {
            return Err(ChannelError::Closed);
        }
        subscribers.closed = true;
        subscribers.senders.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
