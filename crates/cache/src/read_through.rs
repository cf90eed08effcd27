// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through caching

use crate::{Cache, CacheError};
use async_trait::async_trait;
use std::time::Duration;

/// Source of values for cache misses
#[async_trait]
pub trait Loader<V>: Send + Sync {
    async fn load(&self, key: &str) -> Result<V, CacheError>;
}

/// Cache that loads misses from a [`Loader`] and stores them with `ttl`
///
/// Both a never-set key and an expired one count as a miss. Load errors are
/// returned as is; a loaded value that cannot be stored yields
/// [`CacheError::RefreshFailed`].
pub struct ReadThroughCache<C, L> {
    cache: C,
    loader: L,
    ttl: Duration,
}

impl<C, L> ReadThroughCache<C, L> {
    pub fn new(cache: C, loader: L, ttl: Duration) -> Self {
        Self { cache, loader, ttl }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[async_trait]
impl<V, C, L> Cache<V> for ReadThroughCache<C, L>
where
    V: Clone + Send + Sync + 'static,
    C: Cache<V>,
    L: Loader<V>,
{
    async fn get(&self, key: &str) -> Result<V, CacheError> {
        match self.cache.get(key).await {
            Err(e) if e.is_miss() => {
                tracing::debug!(key, "cache miss, loading");
                let value = self.loader.load(key).await?;
                if let Err(e) = self.cache.set(key, value.clone(), self.ttl).await {
                    tracing::warn!(key, error = %e, "failed to store loaded value");
                    return Err(CacheError::RefreshFailed);
                }
                Ok(value)
            }
            other => other,
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.cache.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.delete(key).await
    }
}

#[cfg(test)]
#[path = "read_through_tests.rs"]
mod tests;
