// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! This module provides an error type that includes:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)
//! - The process exit status to report

use std::fmt;
use std::time::Duration;

/// Lock busy, wait gave up, or lease lost (EX_TEMPFAIL)
pub const EXIT_TEMPFAIL: u8 = 75;
/// Lock store unreachable (EX_UNAVAILABLE)
pub const EXIT_UNAVAILABLE: u8 = 69;
/// Command could not be started
pub const EXIT_NOT_RUNNABLE: u8 = 127;
/// Interrupted by Ctrl-C
pub const EXIT_INTERRUPTED: u8 = 130;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct TenureError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Process exit status
    pub exit_code: u8,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TenureError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            exit_code: 1,
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_exit_code(mut self, code: u8) -> Self {
        self.exit_code = code;
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for TenureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for TenureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl TenureError {
    /// Error for when another holder owns the key.
    pub fn lock_held(key: &str, attempts: Option<u32>) -> Self {
        let err = TenureError::new(format!("Failed to acquire lock '{}'", key))
            .with_context("Another process currently holds the lease");
        let err = match attempts {
            Some(n) => err.with_context(format!("Gave up after {} attempts", n)),
            None => err,
        };
        err.with_suggestion("Wait for the current holder to finish")
            .with_suggestion(format!(
                "Block until the lock is free: tenure run {} --wait -- ...",
                key
            ))
            .with_exit_code(EXIT_TEMPFAIL)
    }

    /// Error for when `--timeout` elapsed while waiting.
    pub fn wait_timed_out(key: &str, timeout: Duration) -> Self {
        TenureError::new(format!("Timed out waiting for lock '{}'", key))
            .with_context(format!(
                "The lock stayed busy for {}",
                humantime::format_duration(timeout)
            ))
            .with_suggestion("Raise the limit with --timeout")
            .with_exit_code(EXIT_TEMPFAIL)
    }

    /// Error for when the lease could not be kept while the command ran.
    pub fn lease_lost(key: &str, reason: &str) -> Self {
        TenureError::new(format!("Lost lock '{}' while the command was running", key))
            .with_context(format!("Renewal stopped: {}", reason))
            .with_context("The command was terminated")
            .with_suggestion("Use a longer lease with --lease")
            .with_suggestion("Check connectivity to the lock store")
            .with_exit_code(EXIT_TEMPFAIL)
    }

    /// Error for when the lock store cannot be reached.
    pub fn store_unavailable(url: &str) -> Self {
        TenureError::new(format!("Cannot reach lock store at {}", url))
            .with_suggestion(format!("Check that Redis is running at {}", url))
            .with_suggestion("Point elsewhere with --redis-url or TENURE_REDIS_URL")
            .with_suggestion("Use a process-local lock with --memory")
            .with_exit_code(EXIT_UNAVAILABLE)
    }

    /// Error for when the command could not be started.
    pub fn not_runnable(program: &str) -> Self {
        TenureError::new(format!("Failed to start '{}'", program))
            .with_context("The lock was released without running anything")
            .with_suggestion("Check that the program exists and is on PATH")
            .with_exit_code(EXIT_NOT_RUNNABLE)
    }

    /// Error for Ctrl-C while waiting or running.
    pub fn interrupted(key: &str) -> Self {
        TenureError::new(format!("Interrupted while holding or waiting for '{}'", key))
            .with_exit_code(EXIT_INTERRUPTED)
    }
}
