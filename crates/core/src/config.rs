// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock configuration

use crate::retry::{Backoff, ExponentialBackoff, FixedInterval};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("refresh interval {refresh:?} must be shorter than the lease {lease:?}")]
    RefreshNotShorterThanLease { refresh: Duration, lease: Duration },
}

/// Timing for acquisition and renewal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long the store keeps the lease without renewal
    #[serde(with = "humantime_serde")]
    pub lease: Duration,
    /// Deadline for a single acquisition attempt
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,
    /// How often a held lease is renewed
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Deadline for a single renewal call
    #[serde(with = "humantime_serde")]
    pub refresh_timeout: Duration,
    /// Retry policy for blocking acquisition
    pub retry: RetryConfig,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(2),
            retry: RetryConfig::default(),
        }
    }
}

impl LockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lease", self.lease),
            ("attempt_timeout", self.attempt_timeout),
            ("refresh_interval", self.refresh_interval),
            ("refresh_timeout", self.refresh_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if self.refresh_interval >= self.lease {
            return Err(ConfigError::RefreshNotShorterThanLease {
                refresh: self.refresh_interval,
                lease: self.lease,
            });
        }
        Ok(())
    }
}

fn default_multiplier() -> f64 {
    2.0
}

/// Retry policy, as written in configuration files
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RetryConfig {
    Fixed {
        #[serde(with = "humantime_serde")]
        interval: Duration,
        max_retries: u32,
    },
    Exponential {
        #[serde(with = "humantime_serde")]
        initial: Duration,
        #[serde(with = "humantime_serde")]
        max: Duration,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        max_retries: u32,
    },
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(2),
            multiplier: default_multiplier(),
            max_retries: 10,
        }
    }
}

impl RetryConfig {
    /// A fresh strategy; each acquisition needs its own
    pub fn strategy(&self) -> Backoff {
        match *self {
            RetryConfig::Fixed {
                interval,
                max_retries,
            } => Backoff::Fixed(FixedInterval::new(interval, max_retries)),
            RetryConfig::Exponential {
                initial,
                max,
                multiplier,
                max_retries,
            } => Backoff::Exponential(
                ExponentialBackoff::new(initial, max, max_retries).with_multiplier(multiplier),
            ),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
