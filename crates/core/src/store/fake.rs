// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LockStore, MemoryStore, StoreError};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Store operation kinds, used to target injected faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    SetIfAbsent,
    Acquire,
    CompareAndDelete,
    CompareAndExtend,
}

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    SetIfAbsent {
        key: String,
        token: String,
        lease: Duration,
    },
    Acquire {
        key: String,
        token: String,
        lease: Duration,
    },
    CompareAndDelete {
        key: String,
        token: String,
    },
    CompareAndExtend {
        key: String,
        token: String,
        lease: Duration,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::SetIfAbsent { .. } => StoreOp::SetIfAbsent,
            StoreCall::Acquire { .. } => StoreOp::Acquire,
            StoreCall::CompareAndDelete { .. } => StoreOp::CompareAndDelete,
            StoreCall::CompareAndExtend { .. } => StoreOp::CompareAndExtend,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            StoreCall::SetIfAbsent { token, .. }
            | StoreCall::Acquire { token, .. }
            | StoreCall::CompareAndDelete { token, .. }
            | StoreCall::CompareAndExtend { token, .. } => token,
        }
    }
}

/// Fault to inject into the next call of an operation
#[derive(Debug, Clone)]
pub enum Fault {
    /// Never reply, without touching the store
    Hang,
    /// Apply the operation, then never reply (a lost response)
    ApplyThenHang,
    /// Fail with the given error, without touching the store
    Error(StoreError),
}

/// Fake store that records calls and injects latency and faults
///
/// State lives in a [`MemoryStore`], so lease semantics match the real
/// in-process backend.
#[derive(Clone, Default)]
pub struct FakeStore<C: Clock = SystemClock> {
    inner: MemoryStore<C>,
    calls: Arc<Mutex<Vec<(Instant, StoreCall)>>>,
    faults: Arc<Mutex<HashMap<StoreOp, VecDeque<Fault>>>>,
    latency: Arc<Mutex<Duration>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> FakeStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            inner: MemoryStore::with_clock(clock),
            calls: Arc::default(),
            faults: Arc::default(),
            latency: Arc::default(),
        }
    }

    /// The backing in-memory state
    pub fn memory(&self) -> &MemoryStore<C> {
        &self.inner
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Number of calls made for `op`
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, call)| call.op() == op)
            .count()
    }

    /// When each call for `op` was made
    pub fn times(&self, op: StoreOp) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, call)| call.op() == op)
            .map(|(at, _)| *at)
            .collect()
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Queue a fault for the next call of `op`
    pub fn push_fault(&self, op: StoreOp, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(op)
            .or_default()
            .push_back(fault);
    }

    fn take_fault(&self, op: StoreOp) -> Option<Fault> {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&op)
            .and_then(VecDeque::pop_front)
    }

    async fn intercept<T, F, Fut>(&self, call: StoreCall, apply: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let op = call.op();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((Instant::now(), call));

        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match self.take_fault(op) {
            None => apply().await,
            Some(Fault::Hang) => std::future::pending().await,
            Some(Fault::ApplyThenHang) => {
                let _ = apply().await;
                std::future::pending().await
            }
            Some(Fault::Error(e)) => Err(e),
        }
    }
}

#[async_trait]
impl<C: Clock> LockStore for FakeStore<C> {
    async fn set_if_absent(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let call = StoreCall::SetIfAbsent {
            key: key.to_string(),
            token: token.to_string(),
            lease,
        };
        self.intercept(call, || self.inner.set_if_absent(key, token, lease))
            .await
    }

    async fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let call = StoreCall::Acquire {
            key: key.to_string(),
            token: token.to_string(),
            lease,
        };
        self.intercept(call, || self.inner.acquire(key, token, lease))
            .await
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let call = StoreCall::CompareAndDelete {
            key: key.to_string(),
            token: token.to_string(),
        };
        self.intercept(call, || self.inner.compare_and_delete(key, token))
            .await
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let call = StoreCall::CompareAndExtend {
            key: key.to_string(),
            token: token.to_string(),
            lease,
        };
        self.intercept(call, || self.inner.compare_and_extend(key, token, lease))
            .await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
