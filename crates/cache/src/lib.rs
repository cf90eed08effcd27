// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! tenure-cache: key/value caching layers
//!
//! A [`LocalCache`] holds values in process with per-entry TTLs. The other
//! types wrap any [`Cache`] and add one policy each: a count limit, loading
//! misses from a source, writing through to a sink, deduplicating loads,
//! and gating loads behind a bloom filter.

pub mod bloom;
pub mod error;
pub mod local;
pub mod max_count;
pub mod read_through;
pub mod singleflight;
pub mod write_through;

#[cfg(test)]
mod fakes;

pub use bloom::{BitBloom, BloomFilter, BloomFilterCache, BloomLoader};
pub use error::CacheError;
pub use local::{LocalCache, LocalCacheBuilder};
pub use max_count::MaxCountCache;
pub use read_through::{Loader, ReadThroughCache};
pub use singleflight::{SingleflightCache, SingleflightLoader};
pub use write_through::{Storer, WriteThroughCache};

use async_trait::async_trait;
use std::time::Duration;

/// A key/value cache
///
/// A `ttl` of zero means the entry never expires.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V, CacheError>;

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
