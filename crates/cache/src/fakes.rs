// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake loaders and storers for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::read_through::Loader;
use crate::write_through::Storer;
use crate::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Loader serving a fixed table; clones share the call counter
#[derive(Clone, Default)]
pub struct FakeLoader {
    rows: Arc<HashMap<String, u32>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail: Option<CacheError>,
}

impl FakeLoader {
    pub fn new(rows: &[(&str, u32)]) -> Self {
        Self {
            rows: Arc::new(rows.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            ..Self::default()
        }
    }

    pub fn failing(error: CacheError) -> Self {
        Self {
            fail: Some(error),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader<u32> for FakeLoader {
    async fn load(&self, key: &str) -> Result<u32, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        self.rows
            .get(key)
            .copied()
            .ok_or_else(|| CacheError::Load(format!("no row for {key}")))
    }
}

/// Storer recording every write; clones share the record
#[derive(Clone, Default)]
pub struct FakeStorer {
    stored: Arc<Mutex<Vec<(String, u32)>>>,
    fail: bool,
}

impl FakeStorer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<(String, u32)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storer<u32> for FakeStorer {
    async fn store(&self, key: &str, value: &u32) -> Result<(), CacheError> {
        if self.fail {
            return Err(CacheError::Store("disk full".to_string()));
        }
        self.stored.lock().unwrap().push((key.to_string(), *value));
        Ok(())
    }
}
