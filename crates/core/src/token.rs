// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership tokens
//!
//! A token is all that tells two holders of one key apart: unlock and
//! refresh only succeed while the store still holds the exact token the
//! acquisition wrote. Tokens must never repeat across acquisitions, in this
//! process or any other that shares the store. Every acquisition call draws
//! a fresh one before it talks to the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Random bits in every [`UuidTokens`] token (a v4 UUID fixes 6 of its 128)
pub const RANDOM_BITS: u32 = 122;

/// Source of ownership tokens
pub trait TokenGen: Clone + Send + Sync + 'static {
    /// A token no other acquisition will draw
    fn next(&self) -> String;
}

/// v4 UUID tokens, written as 32 lowercase hex digits
///
/// The random bits come from the operating system's generator, which puts
/// a repeat far outside any realistic number of acquisitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidTokens;

impl TokenGen for UuidTokens {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Predictable `prefix-N` tokens for tests
///
/// Clones draw from the same counter, so tokens stay unique across every
/// client sharing one generator.
#[derive(Clone, Debug)]
pub struct SequentialTokens {
    prefix: Arc<str>,
    drawn: Arc<AtomicU64>,
}

impl SequentialTokens {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: Arc::from(prefix),
            drawn: Arc::new(AtomicU64::new(0)),
        }
    }

    /// How many tokens have been handed out
    pub fn drawn(&self) -> u64 {
        self.drawn.load(Ordering::SeqCst)
    }
}

impl Default for SequentialTokens {
    fn default() -> Self {
        Self::new("token")
    }
}

impl TokenGen for SequentialTokens {
    fn next(&self) -> String {
        let n = self.drawn.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{n}", self.prefix)
    }
}
