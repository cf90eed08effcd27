// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backing store capability for leases
//!
//! A store keeps `key -> token` records with a TTL. Each operation is atomic
//! with respect to every other operation on the same key, which is what makes
//! the compare-then-act primitives safe.

mod memory;

pub use memory::MemoryStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{Fault, FakeStore, StoreCall, StoreOp};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Atomic lease primitives offered by a backend
///
/// Implementations report the logical outcome as a `bool`; turning `false`
/// into a domain error is the caller's job.
#[async_trait]
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Set `key = token` with a TTL of `lease` if the key is absent
    async fn set_if_absent(&self, key: &str, token: &str, lease: Duration)
        -> Result<bool, StoreError>;

    /// Acquire-or-fail: like `set_if_absent`, but also succeeds (re-arming the
    /// TTL) when the key already holds `token`
    async fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError>;

    /// Delete `key` only if it holds `token`
    async fn compare_and_delete(&self, key: &str, token: &str) -> Result<bool, StoreError>;

    /// Reset the TTL of `key` to `lease` only if it holds `token`
    async fn compare_and_extend(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError>;
}
