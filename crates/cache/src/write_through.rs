// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-through caching

use crate::{Cache, CacheError};
use async_trait::async_trait;
use std::time::Duration;

/// Durable sink written before the cache
#[async_trait]
pub trait Storer<V: Sync>: Send + Sync {
    async fn store(&self, key: &str, value: &V) -> Result<(), CacheError>;
}

/// Cache whose writes go to a [`Storer`] first
///
/// The cache is only updated once the store accepted the value.
pub struct WriteThroughCache<C, W> {
    cache: C,
    storer: W,
}

impl<C, W> WriteThroughCache<C, W> {
    pub fn new(cache: C, storer: W) -> Self {
        Self { cache, storer }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn storer(&self) -> &W {
        &self.storer
    }
}

#[async_trait]
impl<V, C, W> Cache<V> for WriteThroughCache<C, W>
where
    V: Clone + Send + Sync + 'static,
    C: Cache<V>,
    W: Storer<V>,
{
    async fn get(&self, key: &str) -> Result<V, CacheError> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.storer.store(key, &value).await?;
        self.cache.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.delete(key).await
    }
}

#[cfg(test)]
#[path = "write_through_tests.rs"]
mod tests;
