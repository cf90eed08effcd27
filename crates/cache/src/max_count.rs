// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Count-limited local cache

use crate::local::{LocalCache, LocalCacheBuilder};
use crate::{Cache, CacheError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// [`LocalCache`] that refuses new keys once `max` entries are stored
///
/// Updating a stored key is always allowed. Every eviction, whether by
/// expiry or `delete`, frees a slot.
pub struct MaxCountCache<V> {
    cache: LocalCache<V>,
    count: Arc<AtomicUsize>,
    max: usize,
}

impl<V: Clone + Send + Sync + 'static> MaxCountCache<V> {
    pub fn new(builder: LocalCacheBuilder<V>, max: usize) -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let freed = Arc::clone(&count);
        let cache = builder
            .chain_evicted(move |_, _| {
                let _ = freed.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    Some(n.saturating_sub(1))
                });
            })
            .build();
        Self { cache, count, max }
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn close(&self) -> Result<(), CacheError> {
        self.cache.close()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> Cache<V> for MaxCountCache<V> {
    async fn get(&self, key: &str) -> Result<V, CacheError> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.cache.set_admitted(key, value, ttl, |exists| {
            if exists {
                return Ok(());
            }
            if self.count.load(Ordering::SeqCst) >= self.max {
                tracing::debug!(key, max = self.max, "cache full, rejecting new key");
                return Err(CacheError::OverCapacity);
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.delete(key).await
    }
}

#[cfg(test)]
#[path = "max_count_tests.rs"]
mod tests;
