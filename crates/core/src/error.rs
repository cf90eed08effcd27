// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock operations

use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the lock client and lock handles
///
/// `Clone` so a single failed acquisition can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum LockError {
    /// Another holder owns the key
    #[error("tenure: failed to preempt lock")]
    FailedToPreempt,
    /// The store no longer holds this handle's token
    #[error("tenure: lock not held")]
    NotHeld,
    /// The retry strategy declined to continue
    #[error("tenure: retry limit exceeded after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LockError>,
    },
    /// The caller's cancellation token fired
    #[error("tenure: operation cancelled")]
    Cancelled,
    /// A shared in-flight acquisition ended without producing a result
    #[error("tenure: in-flight acquisition ended without a result")]
    Abandoned,
    /// A bounded store call did not finish in time
    #[error("tenure: store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("tenure: {0}")]
    Store(#[from] StoreError),
}

impl LockError {
    pub(crate) fn exhausted(attempts: u32) -> Self {
        LockError::RetriesExhausted {
            attempts,
            source: Box::new(LockError::FailedToPreempt),
        }
    }

    /// True when this error, or the error it wraps, means another holder exists
    pub fn is_contention(&self) -> bool {
        match self {
            LockError::FailedToPreempt => true,
            LockError::RetriesExhausted { source, .. } => source.is_contention(),
            _ => false,
        }
    }

    /// True for errors that mean the handle no longer owns its key
    pub fn is_not_held(&self) -> bool {
        matches!(self, LockError::NotHeld)
    }
}
