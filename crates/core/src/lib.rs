// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! tenure-core: distributed mutual exclusion over a lease store
//!
//! This crate provides:
//! - A lock client with try, retrying and deduplicated acquisition
//! - Lock handles with ownership-checked unlock, refresh and auto-renewal
//! - Pluggable retry strategies
//! - The `LockStore` capability and an in-memory implementation

pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod singleflight;
pub mod store;
pub mod token;

// Lock handle before the client that produces it
pub mod lock;
pub mod client;

// Re-exports
pub use client::Client;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, LockConfig, RetryConfig};
pub use error::LockError;
pub use lock::{Lock, LockState, Renewal};
pub use retry::{Backoff, ExponentialBackoff, FixedInterval, Limited, RetryStrategy};
pub use singleflight::{FlightError, Group, Joined};
pub use store::{LockStore, MemoryStore, StoreError};
pub use token::{SequentialTokens, TokenGen, UuidTokens};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use store::{Fault, FakeStore, StoreCall, StoreOp};

pub use tokio_util::sync::CancellationToken;
