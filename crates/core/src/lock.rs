// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock handle and lease renewal
//!
//! A [`Lock`] is advisory: it proves ownership only while the store still
//! holds its token. Every check the handle makes goes through an atomic
//! compare in the store.

use crate::error::LockError;
use crate::store::LockStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a lock handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Acquired and not known to be lost
    Held,
    /// `unlock` was called
    Released,
    /// A renewal found another token (or none) in the store
    Lost,
}

impl LockState {
    /// Check if this state is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LockState::Held)
    }
}

struct Shared {
    state: Mutex<LockState>,
    stop: Notify,
}

impl Shared {
    fn state(&self) -> LockState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = LockState::Released;
    }

    fn lose(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == LockState::Held {
            *state = LockState::Lost;
        }
    }
}

/// Store access bound to one key and token
#[derive(Clone)]
struct Lease<S> {
    store: S,
    key: String,
    token: String,
    ttl: Duration,
    shared: Arc<Shared>,
}

impl<S: LockStore> Lease<S> {
    async fn refresh(&self) -> Result<(), LockError> {
        if self
            .store
            .compare_and_extend(&self.key, &self.token, self.ttl)
            .await?
        {
            tracing::trace!(key = %self.key, "lease extended");
            Ok(())
        } else {
            self.shared.lose();
            tracing::warn!(key = %self.key, "lease no longer held");
            Err(LockError::NotHeld)
        }
    }
}

/// Proof of an acquired lease
///
/// Not meant for concurrent `unlock`/`refresh` from several tasks; confine a
/// handle to one task and hand a [`Renewal`] to the background loop.
pub struct Lock<S> {
    lease: Lease<S>,
}

impl<S> std::fmt::Debug for Lock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("key", &self.lease.key)
            .field("lease", &self.lease.ttl)
            .field("state", &self.lease.shared.state())
            .finish_non_exhaustive()
    }
}

impl<S: LockStore> Lock<S> {
    pub(crate) fn new(store: S, key: &str, token: String, lease: Duration) -> Self {
        Self {
            lease: Lease {
                store,
                key: key.to_string(),
                token,
                ttl: lease,
                shared: Arc::new(Shared {
                    state: Mutex::new(LockState::Held),
                    stop: Notify::new(),
                }),
            },
        }
    }

    pub fn key(&self) -> &str {
        &self.lease.key
    }

    pub fn token(&self) -> &str {
        &self.lease.token
    }

    pub fn lease(&self) -> Duration {
        self.lease.ttl
    }

    pub fn state(&self) -> LockState {
        self.lease.shared.state()
    }

    /// Release the lease if the store still holds this token
    ///
    /// Any running renewal loop is told to stop whatever the outcome.
    pub async fn unlock(&self) -> Result<(), LockError> {
        let result = self
            .lease
            .store
            .compare_and_delete(&self.lease.key, &self.lease.token)
            .await;

        self.lease.shared.release();
        self.lease.shared.stop.notify_waiters();

        match result {
            Ok(true) => {
                tracing::debug!(key = %self.lease.key, "lock released");
                Ok(())
            }
            Ok(false) => {
                tracing::warn!(key = %self.lease.key, "unlock found lease not held");
                Err(LockError::NotHeld)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reset the lease TTL if the store still holds this token
    pub async fn refresh(&self) -> Result<(), LockError> {
        self.lease.refresh().await
    }

    /// [`refresh`](Self::refresh) bounded by `timeout`
    pub async fn refresh_within(&self, timeout: Duration) -> Result<(), LockError> {
        tokio::time::timeout(timeout, self.lease.refresh())
            .await
            .map_err(|_| LockError::Timeout(timeout))?
    }

    /// Renew every `interval` until unlocked, lost or cancelled
    ///
    /// See [`Renewal::run`].
    pub async fn auto_refresh(
        &self,
        interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), LockError> {
        self.renewal().run(interval, timeout, cancel.clone()).await
    }

    /// An owned renewal driver for running the loop on its own task
    pub fn renewal(&self) -> Renewal<S> {
        Renewal {
            lease: self.lease.clone(),
        }
    }
}

/// Renewal loop phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the next tick
    Waiting,
    /// Regular bounded refresh
    Renewing,
    /// Immediate bounded refresh after a timed-out one
    FastRetry,
}

/// Background lease renewal sharing state with its [`Lock`]
pub struct Renewal<S> {
    lease: Lease<S>,
}

impl<S: LockStore> Renewal<S> {
    /// Run the renewal loop
    ///
    /// Each refresh is bounded by `timeout`. A timed-out refresh is retried
    /// immediately rather than after a full `interval`. Returns `Ok(())` when
    /// the handle is unlocked, `NotHeld` when the lease is lost, `Cancelled`
    /// when `cancel` fires, and any other store error as is. Refreshes never
    /// overlap.
    pub async fn run(
        self,
        interval: Duration,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<(), LockError> {
        let key = self.lease.key.as_str();
        let stop = self.lease.shared.stop.notified();
        tokio::pin!(stop);
        stop.as_mut().enable();

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut phase = Phase::Waiting;

        loop {
            phase = match phase {
                Phase::Waiting => {
                    if self.lease.shared.state() == LockState::Released {
                        tracing::debug!(key, "renewal stopped: already released");
                        return Ok(());
                    }
                    tokio::select! {
                        biased;
                        _ = &mut stop => {
                            tracing::debug!(key, "renewal stopped");
                            return Ok(());
                        }
                        _ = cancel.cancelled() => return Err(LockError::Cancelled),
                        _ = ticker.tick() => Phase::Renewing,
                    }
                }
                Phase::Renewing | Phase::FastRetry => {
                    let outcome = tokio::select! {
                        biased;
                        _ = &mut stop => {
                            tracing::debug!(key, "renewal stopped");
                            return Ok(());
                        }
                        _ = cancel.cancelled() => return Err(LockError::Cancelled),
                        res = tokio::time::timeout(timeout, self.lease.refresh()) => res,
                    };
                    match outcome {
                        Ok(Ok(())) => {
                            if phase == Phase::FastRetry {
                                ticker.reset();
                            }
                            Phase::Waiting
                        }
                        Err(_) => {
                            tracing::warn!(key, ?timeout, "refresh timed out, retrying now");
                            Phase::FastRetry
                        }
                        Ok(Err(e)) => return Err(e),
                    }
                }
            };
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
