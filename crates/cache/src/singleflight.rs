// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through caching with deduplicated loads

use crate::read_through::{Loader, ReadThroughCache};
use crate::CacheError;
use async_trait::async_trait;
use std::sync::Arc;
use tenure_core::{CancellationToken, Group};

/// [`Loader`] that runs at most one load per key at a time
///
/// Concurrent misses for the same key wait for the load already running
/// and all receive its result, success or failure.
pub struct SingleflightLoader<L, V> {
    loader: Arc<L>,
    group: Group<Result<V, CacheError>>,
}

impl<L, V> SingleflightLoader<L, V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            group: Group::new(),
        }
    }

    /// Keys with a load running
    pub fn in_flight(&self) -> usize {
        self.group.in_flight()
    }
}

#[async_trait]
impl<L, V> Loader<V> for SingleflightLoader<L, V>
where
    V: Clone + Send + Sync + 'static,
    L: Loader<V> + 'static,
{
    async fn load(&self, key: &str) -> Result<V, CacheError> {
        let loader = Arc::clone(&self.loader);
        let owned_key = key.to_string();
        let joined = self
            .group
            .join(key, &CancellationToken::new(), move |_| async move {
                loader.load(&owned_key).await
            })
            .await;
        match joined {
            Ok(joined) => joined.value,
            Err(e) => Err(CacheError::Load(e.to_string())),
        }
    }
}

/// Read-through cache whose misses share one load per key
pub type SingleflightCache<C, L, V> = ReadThroughCache<C, SingleflightLoader<L, V>>;

#[cfg(test)]
#[path = "singleflight_tests.rs"]
mod tests;
