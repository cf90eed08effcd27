// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bloom-filter gated loads
//!
//! A bloom filter answers "definitely absent" or "maybe present". Misses for
//! keys the filter rules out skip the loader entirely.

use crate::read_through::{Loader, ReadThroughCache};
use crate::CacheError;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Membership filter with no false negatives
#[async_trait]
pub trait BloomFilter: Send + Sync {
    async fn has_key(&self, key: &str) -> bool;
}

/// [`Loader`] that consults a [`BloomFilter`] before loading
pub struct BloomLoader<L, B> {
    loader: L,
    filter: B,
}

impl<L, B> BloomLoader<L, B> {
    pub fn new(loader: L, filter: B) -> Self {
        Self { loader, filter }
    }

    pub fn filter(&self) -> &B {
        &self.filter
    }
}

#[async_trait]
impl<V, L, B> Loader<V> for BloomLoader<L, B>
where
    V: Send + 'static,
    L: Loader<V>,
    B: BloomFilter,
{
    async fn load(&self, key: &str) -> Result<V, CacheError> {
        if !self.filter.has_key(key).await {
            tracing::trace!(key, "bloom filter rules key out");
            return Err(CacheError::KeyNotExists);
        }
        self.loader.load(key).await
    }
}

/// Read-through cache that skips loads for keys a bloom filter rules out
pub type BloomFilterCache<C, L, B> = ReadThroughCache<C, BloomLoader<L, B>>;

/// In-memory bloom filter over a fixed bit array
///
/// Uses double hashing to derive `hashes` bit positions per key.
pub struct BitBloom {
    words: Vec<AtomicU64>,
    bits: u64,
    hashes: u32,
}

impl BitBloom {
    pub fn new(bits: usize, hashes: u32) -> Self {
        let bits = bits.max(64) as u64;
        let words = bits.div_ceil(64);
        Self {
            words: (0..words).map(|_| AtomicU64::new(0)).collect(),
            bits: words * 64,
            hashes: hashes.max(1),
        }
    }

    /// Size a filter for `items` keys at roughly `false_positive_rate`
    pub fn with_rate(items: usize, false_positive_rate: f64) -> Self {
        let n = items.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let bits = (-n * p.ln() / (ln2 * ln2)).ceil();
        let hashes = (bits / n * ln2).round().max(1.0);
        Self::new(bits as usize, hashes as u32)
    }

    pub fn insert(&self, key: &str) {
        for bit in self.positions(key) {
            self.words[(bit / 64) as usize].fetch_or(1 << (bit % 64), Ordering::Relaxed);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions(key)
            .all(|bit| self.words[(bit / 64) as usize].load(Ordering::Relaxed) & (1 << (bit % 64)) != 0)
    }

    fn positions(&self, key: &str) -> impl Iterator<Item = u64> + '_ {
        let h1 = seeded_hash(key, 0);
        let h2 = seeded_hash(key, 1) | 1;
        (0..u64::from(self.hashes)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bits)
    }
}

fn seeded_hash(key: &str, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl BloomFilter for BitBloom {
    async fn has_key(&self, key: &str) -> bool {
        self.contains(key)
    }
}

#[cfg(test)]
#[path = "bloom_tests.rs"]
mod tests;
