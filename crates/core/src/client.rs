// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock client
//!
//! Three ways to acquire a lease:
//! - [`Client::try_lock`] - one conditional set, no retries
//! - [`Client::lock`] - bounded attempts driven by a [`RetryStrategy`]
//! - [`Client::singleflight_lock`] - `lock`, with concurrent in-process
//!   callers for the same key sharing one attempt

use crate::config::LockConfig;
use crate::error::LockError;
use crate::lock::Lock;
use crate::retry::RetryStrategy;
use crate::singleflight::{FlightError, Group, Joined};
use crate::store::LockStore;
use crate::token::{TokenGen, UuidTokens};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Acquires leases from a [`LockStore`]
#[derive(Clone)]
pub struct Client<S, G = UuidTokens> {
    store: S,
    tokens: G,
    flights: Group<Result<(), LockError>>,
}

impl<S: LockStore> Client<S> {
    pub fn new(store: S) -> Self {
        Self::with_tokens(store, UuidTokens)
    }
}

impl<S: LockStore, G: TokenGen> Client<S, G> {
    pub fn with_tokens(store: S, tokens: G) -> Self {
        Self {
            store,
            tokens,
            flights: Group::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Single non-blocking attempt
    ///
    /// Fails with `FailedToPreempt` when someone else holds `key`; store
    /// errors, timeouts included, are returned as is.
    pub async fn try_lock(&self, key: &str, lease: Duration) -> Result<Lock<S>, LockError> {
        let token = self.tokens.next();
        if self.store.set_if_absent(key, &token, lease).await? {
            tracing::debug!(key, "lock acquired");
            Ok(Lock::new(self.store.clone(), key, token, lease))
        } else {
            tracing::debug!(key, "lock held elsewhere");
            Err(LockError::FailedToPreempt)
        }
    }

    /// Acquire `key`, retrying per `retry`
    ///
    /// Each attempt is bounded by `attempt_timeout`; an attempt that times
    /// out counts as a failed attempt and is retried. All attempts share one
    /// token, so an attempt whose reply was lost is recognised by the next.
    /// Any other store error fails immediately.
    pub async fn lock<R: RetryStrategy>(
        &self,
        key: &str,
        lease: Duration,
        attempt_timeout: Duration,
        mut retry: R,
        cancel: &CancellationToken,
    ) -> Result<Lock<S>, LockError> {
        let token = self.tokens.next();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LockError::Cancelled),
                res = tokio::time::timeout(
                    attempt_timeout,
                    self.store.acquire(key, &token, lease),
                ) => res,
            };

            match attempt {
                Ok(Ok(true)) => {
                    tracing::debug!(key, attempts, "lock acquired");
                    return Ok(Lock::new(self.store.clone(), key, token, lease));
                }
                Ok(Ok(false)) => tracing::debug!(key, attempts, "lock held elsewhere"),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => tracing::warn!(key, attempts, ?attempt_timeout, "lock attempt timed out"),
            }

            let Some(interval) = retry.next() else {
                tracing::debug!(key, attempts, "retries exhausted");
                return Err(LockError::exhausted(attempts));
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LockError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// [`lock`](Self::lock) with timing and retry policy from `config`
    pub async fn lock_with(
        &self,
        key: &str,
        config: &LockConfig,
        cancel: &CancellationToken,
    ) -> Result<Lock<S>, LockError> {
        self.lock(
            key,
            config.lease,
            config.attempt_timeout,
            config.retry.strategy(),
            cancel,
        )
        .await
    }

    /// [`lock`](Self::lock), deduplicated across concurrent callers in this
    /// process
    ///
    /// Callers that arrive while an attempt for `key` is in flight wait for
    /// it instead of contacting the store. A failure is returned to every
    /// waiter. A success belongs to the caller that started the attempt; the
    /// others then start, or join, the next attempt. `cancel` only ends this
    /// caller's wait.
    pub async fn singleflight_lock<R>(
        &self,
        key: &str,
        lease: Duration,
        attempt_timeout: Duration,
        retry: R,
        cancel: &CancellationToken,
    ) -> Result<Lock<S>, LockError>
    where
        R: RetryStrategy + Clone + 'static,
    {
        loop {
            let (tx, rx) = oneshot::channel::<Lock<S>>();
            let client = self.clone();
            let owned_key = key.to_string();
            let retry = retry.clone();

            let joined = self
                .flights
                .join(key, cancel, move |flight_cancel| async move {
                    let lock = client
                        .lock(&owned_key, lease, attempt_timeout, retry, &flight_cancel)
                        .await?;
                    if let Err(orphan) = tx.send(lock) {
                        tracing::debug!(key = %owned_key, "caller left before acquisition, releasing");
                        if let Err(e) = orphan.unlock().await {
                            tracing::warn!(key = %owned_key, error = %e, "failed to release orphaned lock");
                        }
                    }
                    Ok::<(), LockError>(())
                })
                .await;

            match joined {
                Err(FlightError::Cancelled) => return Err(LockError::Cancelled),
                Err(FlightError::Abandoned) => return Err(LockError::Abandoned),
                Ok(Joined { value: Err(e), .. }) => return Err(e),
                Ok(Joined {
                    value: Ok(()),
                    leader: true,
                }) => return rx.await.map_err(|_| LockError::Abandoned),
                Ok(Joined {
                    value: Ok(()),
                    leader: false,
                }) => {
                    tracing::debug!(key, "shared attempt went to another caller, trying again");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
