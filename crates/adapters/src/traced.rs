// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tenure_core::{LockStore, StoreError};
use tracing::Instrument;

/// Wrapper that adds tracing to any LockStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn record(result: &Result<bool, StoreError>, elapsed: Duration, applied: &str, refused: &str) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match result {
        Ok(true) => tracing::debug!(elapsed_ms, "{applied}"),
        Ok(false) => tracing::debug!(elapsed_ms, "{refused}"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "store call failed"),
    }
}

#[async_trait]
impl<S: LockStore> LockStore for TracedStore<S> {
    async fn set_if_absent(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.set_if_absent", key, ?lease);
        async {
            let start = Instant::now();
            let result = self.inner.set_if_absent(key, token, lease).await;
            record(&result, start.elapsed(), "key set", "key already held");
            result
        }
        .instrument(span)
        .await
    }

    async fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.acquire", key, ?lease);
        async {
            let start = Instant::now();
            let result = self.inner.acquire(key, token, lease).await;
            record(&result, start.elapsed(), "lease acquired", "held by another token");
            result
        }
        .instrument(span)
        .await
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.compare_and_delete", key);
        async {
            let start = Instant::now();
            let result = self.inner.compare_and_delete(key, token).await;
            record(&result, start.elapsed(), "lease deleted", "token mismatch");
            result
        }
        .instrument(span)
        .await
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let span = tracing::trace_span!("store.compare_and_extend", key, ?lease);
        async {
            let start = Instant::now();
            let result = self.inner.compare_and_extend(key, token, lease).await;
            record(&result, start.elapsed(), "lease extended", "token mismatch");
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
