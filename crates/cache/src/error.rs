// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache: key not found")]
    NotFound,
    /// The key was present but its TTL ran out
    #[error("cache: key does not exist")]
    KeyNotExists,
    #[error("cache: over capacity")]
    OverCapacity,
    #[error("cache: already closed")]
    Closed,
    /// A loaded value could not be written back
    #[error("cache: failed to refresh cache")]
    RefreshFailed,
    #[error("cache: load failed: {0}")]
    Load(String),
    #[error("cache: store failed: {0}")]
    Store(String),
}

impl CacheError {
    /// True for both a never-set key and an expired one
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound | CacheError::KeyNotExists)
    }
}
