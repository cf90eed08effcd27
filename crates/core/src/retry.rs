// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry strategies for blocking acquisition
//!
//! A strategy is asked once per failed attempt. It answers with the interval
//! to wait before the next attempt, or `None` once its budget is spent.

use std::time::Duration;

/// Produces retry intervals until the attempt budget runs out
pub trait RetryStrategy: Send {
    /// Interval before the next attempt, or `None` to stop retrying
    fn next(&mut self) -> Option<Duration>;
}

impl<S: RetryStrategy + ?Sized> RetryStrategy for Box<S> {
    fn next(&mut self) -> Option<Duration> {
        (**self).next()
    }
}

/// Same interval every time, at most `max_retries` times
#[derive(Clone, Debug)]
pub struct FixedInterval {
    interval: Duration,
    max_retries: u32,
    retries: u32,
}

impl FixedInterval {
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval,
            max_retries,
            retries: 0,
        }
    }

    /// Retry forever; only cancellation ends the wait
    pub fn forever(interval: Duration) -> Self {
        Self::new(interval, u32::MAX)
    }
}

impl RetryStrategy for FixedInterval {
    fn next(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        Some(self.interval)
    }
}

/// Interval grows by `multiplier` after each retry, capped at `max`
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
    max_retries: u32,
    retries: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            current: initial.min(max),
            max,
            multiplier: 2.0,
            max_retries,
            retries: 0,
        }
    }

    /// Growth factor; values below 1.0 are treated as 1.0
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        let interval = self.current;
        let scaled = self.current.as_nanos() as f64 * self.multiplier;
        self.current = if scaled >= self.max.as_nanos() as f64 {
            self.max
        } else {
            Duration::from_nanos(scaled as u64)
        };
        Some(interval)
    }
}

/// Caps any strategy at `max_retries`
#[derive(Clone, Debug)]
pub struct Limited<S> {
    inner: S,
    max_retries: u32,
    retries: u32,
}

impl<S: RetryStrategy> Limited<S> {
    pub fn new(inner: S, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            retries: 0,
        }
    }
}

impl<S: RetryStrategy> RetryStrategy for Limited<S> {
    fn next(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        self.inner.next()
    }
}

/// A strategy built from configuration
#[derive(Clone, Debug)]
pub enum Backoff {
    Fixed(FixedInterval),
    Exponential(ExponentialBackoff),
}

impl RetryStrategy for Backoff {
    fn next(&mut self) -> Option<Duration> {
        match self {
            Backoff::Fixed(s) => s.next(),
            Backoff::Exponential(s) => s.next(),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
