// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file loading
//!
//! Precedence, lowest first: built-in defaults, the TOML file,
//! `TENURE_REDIS_URL`, command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tenure_core::LockConfig;

pub const REDIS_URL_ENV: &str = "TENURE_REDIS_URL";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Redis server holding the leases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    pub lock: LockConfig,
}

impl Config {
    /// `$XDG_CONFIG_HOME/tenure/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tenure").join("config.toml"))
    }

    /// Load from `path`, or from the default location when it exists
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env_url(std::env::var(REDIS_URL_ENV).ok()))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render config")
    }

    /// Override the Redis URL with a non-empty environment value
    pub fn with_env_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.redis_url = Some(url);
        }
        self
    }

    pub fn redis_url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
