// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis lease store

mod scripts;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{ErrorKind, RedisError, Script};
use std::sync::Arc;
use std::time::Duration;
use tenure_core::{LockStore, StoreError};

struct Scripts {
    acquire: Script,
    release: Script,
    extend: Script,
}

/// Lease store backed by a Redis server
///
/// Conditional set goes through `SET NX PX`; the compare operations run as
/// Lua scripts (EVALSHA, falling back to EVAL on a cold script cache).
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    scripts: Arc<Scripts>,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(store_error)?;
        tracing::debug!(url, "connected to redis");
        Ok(Self::from_manager(conn))
    }

    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self {
            conn,
            scripts: Arc::new(Scripts {
                acquire: Script::new(scripts::ACQUIRE),
                release: Script::new(scripts::RELEASE),
                extend: Script::new(scripts::EXTEND),
            }),
        }
    }
}

#[async_trait]
impl LockStore for RedisStore {
    async fn set_if_absent(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(lease_millis(lease))
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;
        match reply.as_deref() {
            Some("OK") => Ok(true),
            None => Ok(false),
            Some(other) => Err(StoreError::UnexpectedReply(format!("SET NX: {other}"))),
        }
    }

    async fn acquire(&self, key: &str, token: &str, lease: Duration) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: i64 = self
            .scripts
            .acquire
            .key(key)
            .arg(token)
            .arg(lease_millis(lease))
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;
        flag("acquire", reply)
    }

    async fn compare_and_delete(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: i64 = self
            .scripts
            .release
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;
        flag("release", reply)
    }

    async fn compare_and_extend(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: i64 = self
            .scripts
            .extend
            .key(key)
            .arg(token)
            .arg(lease_millis(lease))
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;
        flag("extend", reply)
    }
}

/// Lease in whole milliseconds, never zero (PX rejects 0)
fn lease_millis(lease: Duration) -> u64 {
    u64::try_from(lease.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn flag(script: &str, reply: i64) -> Result<bool, StoreError> {
    match reply {
        1 => Ok(true),
        0 => Ok(false),
        other => Err(StoreError::UnexpectedReply(format!(
            "{script} script returned {other}"
        ))),
    }
}

fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::Connection(e.to_string())
    } else if e.kind() == ErrorKind::TypeError {
        StoreError::UnexpectedReply(e.to_string())
    } else {
        StoreError::Script(e.to_string())
    }
}

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;
