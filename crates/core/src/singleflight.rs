// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process deduplication of concurrent work per key
//!
//! The first caller for a key starts a flight: its work runs on a spawned
//! task and the result is broadcast to everyone who joined while it was in
//! the air. The flight forgets itself before publishing, so later callers
//! always start fresh work. Waiters are reference counted; a waiter giving
//! up only affects itself, and the flight is cancelled once nobody is left
//! waiting for it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Why a waiter did not receive a flight's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlightError {
    #[error("waiter cancelled")]
    Cancelled,
    #[error("flight ended without a result")]
    Abandoned,
}

/// Result delivered to a waiter
#[derive(Debug, Clone)]
pub struct Joined<T> {
    pub value: T,
    /// True when this caller's own work produced the value
    pub leader: bool,
}

struct Flight<T> {
    id: u64,
    rx: watch::Receiver<Option<T>>,
    waiters: usize,
    cancel: CancellationToken,
}

struct Flights<T> {
    by_key: HashMap<String, Flight<T>>,
    next_id: u64,
}

/// Deduplicates concurrent work for the same key
pub struct Group<T> {
    flights: Arc<Mutex<Flights<T>>>,
}

impl<T> Clone for Group<T> {
    fn clone(&self) -> Self {
        Self {
            flights: Arc::clone(&self.flights),
        }
    }
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(Flights {
                by_key: HashMap::new(),
                next_id: 0,
            })),
        }
    }
}

enum Role<T> {
    Leader {
        id: u64,
        tx: watch::Sender<Option<T>>,
        cancel: CancellationToken,
    },
    Follower,
}

impl<T: Clone + Send + Sync + 'static> Group<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with work in the air
    pub fn in_flight(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_key
            .len()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.flights
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_key
            .contains_key(key)
    }

    /// Run `work` for `key`, or wait for the flight already running it
    ///
    /// `work` receives the flight's cancellation token, which fires only when
    /// every waiter has given up. `cancel` ends this caller's wait and
    /// nothing else.
    pub async fn join<F, Fut>(
        &self,
        key: &str,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<Joined<T>, FlightError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (mut rx, id, role) = {
            let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(flight) = flights.by_key.get_mut(key) {
                flight.waiters += 1;
                (flight.rx.clone(), flight.id, Role::Follower)
            } else {
                flights.next_id += 1;
                let id = flights.next_id;
                let (tx, rx) = watch::channel(None);
                let flight_cancel = CancellationToken::new();
                flights.by_key.insert(
                    key.to_string(),
                    Flight {
                        id,
                        rx: rx.clone(),
                        waiters: 1,
                        cancel: flight_cancel.clone(),
                    },
                );
                (
                    rx,
                    id,
                    Role::Leader {
                        id,
                        tx,
                        cancel: flight_cancel,
                    },
                )
            }
        };
        let _guard = WaiterGuard {
            flights: Arc::clone(&self.flights),
            key: key.to_string(),
            id,
        };

        let leader = matches!(role, Role::Leader { .. });
        match role {
            Role::Leader { id, tx, cancel } => {
                let fut = work(cancel);
                let flights = Arc::clone(&self.flights);
                let key = key.to_string();
                tokio::spawn(async move {
                    let value = fut.await;
                    let mut flights = flights.lock().unwrap_or_else(|e| e.into_inner());
                    if flights.by_key.get(&key).is_some_and(|f| f.id == id) {
                        flights.by_key.remove(&key);
                    }
                    tx.send_replace(Some(value));
                });
            }
            Role::Follower => drop(work),
        }

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            res = rx.wait_for(Option::is_some) => Some(res.map(|value| (*value).clone())),
        };

        match waited {
            None => Err(FlightError::Cancelled),
            Some(Ok(Some(value))) => Ok(Joined { value, leader }),
            Some(_) => Err(FlightError::Abandoned),
        }
    }
}

/// Releases one waiter's interest in a flight
struct WaiterGuard<T> {
    flights: Arc<Mutex<Flights<T>>>,
    key: String,
    id: u64,
}

impl<T> Drop for WaiterGuard<T> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        let Some(flight) = flights.by_key.get_mut(&self.key) else {
            return;
        };
        if flight.id != self.id {
            return;
        }
        flight.waiters = flight.waiters.saturating_sub(1);
        if flight.waiters == 0 {
            tracing::debug!(key = %self.key, "no waiters left, cancelling flight");
            flight.cancel.cancel();
            flights.by_key.remove(&self.key);
        }
    }
}

#[cfg(test)]
#[path = "singleflight_tests.rs"]
mod tests;
