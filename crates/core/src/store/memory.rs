// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local lease store
//!
//! All operations run under a single mutex, so every check-and-act sequence
//! is atomic. Expired records are dropped lazily the next time their key is
//! touched.

use super::{LockStore, StoreError};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Record {
    token: String,
    deadline: Instant,
}

/// In-memory store with per-key TTLs
#[derive(Clone, Debug, Default)]
pub struct MemoryStore<C: Clock = SystemClock> {
    records: Arc<Mutex<HashMap<String, Record>>>,
    clock: C,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> MemoryStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Token currently holding `key`, if its lease is still live
    pub fn holder(&self, key: &str) -> Option<String> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Self::live(&mut records, key, self.clock.now()).map(|r| r.token.clone())
    }

    /// Time left on the lease for `key`
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Self::live(&mut records, key, now).map(|r| r.deadline.saturating_duration_since(now))
    }

    /// Drop the record for `key` as if its lease had run out
    pub fn expire(&self, key: &str) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.retain(|_, r| r.deadline > now);
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live<'a>(
        records: &'a mut HashMap<String, Record>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut Record> {
        if records.get(key).is_some_and(|r| r.deadline <= now) {
            records.remove(key);
        }
        records.get_mut(key)
    }

    fn insert(&self, records: &mut HashMap<String, Record>, key: &str, token: &str, lease: Duration) {
        records.insert(
            key.to_string(),
            Record {
                token: token.to_string(),
                deadline: self.clock.now() + lease,
            },
        );
    }
}

#[async_trait]
impl<C: Clock> LockStore for MemoryStore<C> {
    async fn set_if_absent(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if Self::live(&mut records, key, self.clock.now()).is_some() {
            return Ok(false);
        }
        self.insert(&mut records, key, token, lease);
        Ok(true)
    }

    async fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match Self::live(&mut records, key, now) {
            None => {
                self.insert(&mut records, key, token, lease);
                Ok(true)
            }
            Some(record) if record.token == token => {
                record.deadline = now + lease;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let held = Self::live(&mut records, key, self.clock.now()).is_some_and(|r| r.token == token);
        if held {
            records.remove(key);
        }
        Ok(held)
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match Self::live(&mut records, key, now) {
            Some(record) if record.token == token => {
                record.deadline = now + lease;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
