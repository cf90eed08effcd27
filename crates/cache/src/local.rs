// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process cache with per-entry TTLs
//!
//! Expired entries are removed two ways: `get` drops an expired entry it
//! runs into, and a background task sweeps a bounded batch of entries on a
//! fixed interval. Each sweep resumes where the previous one stopped, so
//! successive ticks walk the whole map. Every removal is reported to the eviction callback, which
//! runs under the cache's write lock and must not call back into the cache.

use crate::{Cache, CacheError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Entries examined per sweep tick
pub const SWEEP_BATCH: usize = 1000;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

type EvictFn<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

struct Entry<V> {
    value: V,
    deadline: Option<Instant>,
}

impl<V> Entry<V> {
    fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| d <= now)
    }
}

struct Shared<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    on_evicted: Option<EvictFn<V>>,
    /// Iteration position the next sweep starts from
    cursor: AtomicUsize,
}

impl<V> Shared<V> {
    fn evict(&self, entries: &mut HashMap<String, Entry<V>>, key: &str) -> bool {
        let Some(entry) = entries.remove(key) else {
            return false;
        };
        if let Some(callback) = &self.on_evicted {
            callback(key, &entry.value);
        }
        true
    }

    fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let len = entries.len();
        let start = match self.cursor.load(Ordering::Relaxed) {
            cursor if cursor < len => cursor,
            _ => 0,
        };
        let examined = (len - start).min(SWEEP_BATCH);
        let expired: Vec<String> = entries
            .iter()
            .skip(start)
            .take(examined)
            .filter(|(_, entry)| entry.expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.evict(&mut entries, key);
        }

        // Removal leaves the order of the survivors intact
        let next = if start + examined >= len {
            0
        } else {
            start + examined - expired.len()
        };
        self.cursor.store(next, Ordering::Relaxed);
        expired.len()
    }
}

/// Builder for [`LocalCache`]
pub struct LocalCacheBuilder<V> {
    capacity: usize,
    sweep_interval: Duration,
    on_evicted: Option<EvictFn<V>>,
}

impl<V> Default for LocalCacheBuilder<V> {
    fn default() -> Self {
        Self {
            capacity: 0,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            on_evicted: None,
        }
    }
}

impl<V: Clone + Send + Sync + 'static> LocalCacheBuilder<V> {
    /// Pre-allocate room for `capacity` entries
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Called with every entry removed by expiry or `delete`
    pub fn on_evicted(mut self, callback: impl Fn(&str, &V) + Send + Sync + 'static) -> Self {
        self.on_evicted = Some(Arc::new(callback));
        self
    }

    /// Run `callback` ahead of any callback already configured
    pub(crate) fn chain_evicted(
        mut self,
        callback: impl Fn(&str, &V) + Send + Sync + 'static,
    ) -> Self {
        let next = self.on_evicted.take();
        self.on_evicted = Some(Arc::new(move |key: &str, value: &V| {
            callback(key, value);
            if let Some(next) = &next {
                next(key, value);
            }
        }));
        self
    }

    /// Build the cache and start its sweep task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> LocalCache<V> {
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::with_capacity(self.capacity)),
            on_evicted: self.on_evicted,
            cursor: AtomicUsize::new(0),
        });
        let stop = CancellationToken::new();
        spawn_sweeper(
            Arc::downgrade(&shared),
            self.sweep_interval.max(Duration::from_millis(1)),
            stop.clone(),
        );
        LocalCache {
            shared,
            stop,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn spawn_sweeper<V: Send + Sync + 'static>(
    shared: Weak<Shared<V>>,
    interval: Duration,
    stop: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(shared) = shared.upgrade() else {
                        break;
                    };
                    let evicted = shared.sweep(Instant::now());
                    if evicted > 0 {
                        tracing::trace!(evicted, "swept expired entries");
                    }
                }
            }
        }
        tracing::debug!("cache sweeper stopped");
    });
}

/// In-memory [`Cache`] with lazy and periodic expiry
///
/// Clones share entries and the sweep task.
pub struct LocalCache<V> {
    shared: Arc<Shared<V>>,
    stop: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl<V> Clone for LocalCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            stop: self.stop.clone(),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> LocalCache<V> {
    pub fn builder() -> LocalCacheBuilder<V> {
        LocalCacheBuilder::default()
    }

    /// Cache sweeping expired entries every `sweep_interval`
    pub fn new(sweep_interval: Duration) -> Self {
        Self::builder().sweep_interval(sweep_interval).build()
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.shared
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the sweep task
    ///
    /// Entries stay readable and writable; only periodic expiry ends.
    pub fn close(&self) -> Result<(), CacheError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        self.stop.cancel();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Insert under the write lock after `admit` approves
    ///
    /// `admit` is told whether the key is already stored.
    pub(crate) fn set_admitted(
        &self,
        key: &str,
        value: V,
        ttl: Duration,
        admit: impl FnOnce(bool) -> Result<(), CacheError>,
    ) -> Result<(), CacheError> {
        let mut entries = self
            .shared
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner());
        admit(entries.contains_key(key))?;
        let deadline = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        entries.insert(key.to_string(), Entry { value, deadline });
        Ok(())
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> Cache<V> for LocalCache<V> {
    async fn get(&self, key: &str) -> Result<V, CacheError> {
        let now = Instant::now();
        {
            let entries = self
                .shared
                .entries
                .read()
                .unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return Err(CacheError::NotFound),
                Some(entry) if !entry.expired(now) => return Ok(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; the key may have been reset
        let mut entries = self
            .shared
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            None => Err(CacheError::NotFound),
            Some(entry) if entry.expired(now) => {
                self.shared.evict(&mut entries, key);
                Err(CacheError::KeyNotExists)
            }
            Some(entry) => Ok(entry.value.clone()),
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.set_admitted(key, value, ttl, |_| Ok(()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .shared
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner());
        self.shared.evict(&mut entries, key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
