// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tenure run <key> -- <command>` - Run a command while holding a lock

use crate::config::Config;
use crate::error::TenureError;
use anyhow::{Context, Result};
use clap::Args;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;
use tenure_core::{CancellationToken, Client, Lock, LockConfig, LockError, LockStore};
use tokio::process::Command;

/// Exported to the command so it knows which lock it runs under
pub const LOCK_KEY_ENV: &str = "TENURE_LOCK_KEY";

#[derive(Args)]
pub struct RunArgs {
    /// Lock key (e.g., "deploy/production")
    pub key: String,

    /// Lease duration (e.g., "30s", "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub lease: Option<Duration>,

    /// Wait for the lock instead of failing when it is held
    #[arg(long)]
    pub wait: bool,

    /// Stop waiting after this long (implies --wait)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Command and arguments to run
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl RunArgs {
    fn waits(&self) -> bool {
        self.wait || self.timeout.is_some()
    }
}

/// Lock timing after applying `--lease`
///
/// A lease shorter than the configured refresh interval renews at a third
/// of the lease.
pub fn effective_config(base: &LockConfig, lease: Option<Duration>) -> LockConfig {
    let Some(lease) = lease else {
        return base.clone();
    };
    let mut config = base.clone().with_lease(lease);
    if config.refresh_interval >= lease {
        config.refresh_interval = lease / 3;
    }
    config
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Lost(String),
    Interrupted,
}

pub async fn handle<S: LockStore>(store: S, args: RunArgs, config: &Config) -> Result<ExitCode> {
    let lock_config = effective_config(&config.lock, args.lease);
    lock_config.validate().context("invalid lock configuration")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            interrupt.cancel();
        }
    });

    let client = Client::new(store);
    let lock = acquire(&client, &args, &lock_config, &cancel).await?;
    tracing::info!(key = %args.key, lease = ?lock_config.lease, "lock acquired");

    let mut renewal = tokio::spawn(lock.renewal().run(
        lock_config.refresh_interval,
        lock_config.refresh_timeout,
        CancellationToken::new(),
    ));

    let (program, program_args) = match args.command.split_first() {
        Some(split) => split,
        None => anyhow::bail!("no command given"),
    };
    let mut child = match Command::new(program)
        .args(program_args)
        .env(LOCK_KEY_ENV, &args.key)
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            release(&lock).await;
            return Err(TenureError::not_runnable(program).with_source(e).into());
        }
    };

    let outcome = tokio::select! {
        status = child.wait() => Outcome::Exited(status),
        joined = &mut renewal => Outcome::Lost(match joined {
            Ok(Ok(())) => "renewal stopped".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        }),
        _ = cancel.cancelled() => Outcome::Interrupted,
    };

    match outcome {
        Outcome::Exited(status) => {
            release(&lock).await;
            let _ = renewal.await;
            let status = status.context("failed to wait for command")?;
            tracing::debug!(%status, "command finished");
            Ok(ExitCode::from(exit_code(status)))
        }
        Outcome::Lost(reason) => {
            tracing::error!(key = %args.key, reason = %reason, "lease lost, terminating command");
            let _ = child.kill().await;
            release(&lock).await;
            Err(TenureError::lease_lost(&args.key, &reason).into())
        }
        Outcome::Interrupted => {
            let _ = child.kill().await;
            release(&lock).await;
            let _ = renewal.await;
            Err(TenureError::interrupted(&args.key).into())
        }
    }
}

async fn acquire<S: LockStore>(
    client: &Client<S>,
    args: &RunArgs,
    config: &LockConfig,
    cancel: &CancellationToken,
) -> Result<Lock<S>> {
    let result = if args.waits() {
        let attempt = client.lock_with(&args.key, config, cancel);
        match args.timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => return Err(TenureError::wait_timed_out(&args.key, limit).into()),
            },
            None => attempt.await,
        }
    } else {
        client.try_lock(&args.key, config.lease).await
    };
    result.map_err(|e| acquire_error(&args.key, e))
}

fn acquire_error(key: &str, e: LockError) -> anyhow::Error {
    if e.is_contention() {
        let attempts = match &e {
            LockError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        };
        return TenureError::lock_held(key, attempts).into();
    }
    match e {
        LockError::Cancelled => TenureError::interrupted(key).into(),
        e => anyhow::Error::new(e).context(format!("failed to acquire lock '{}'", key)),
    }
}

async fn release<S: LockStore>(lock: &Lock<S>) {
    match lock.unlock().await {
        Ok(()) => tracing::info!(key = lock.key(), "lock released"),
        Err(e) => tracing::warn!(key = lock.key(), error = %e, "failed to release lock"),
    }
}

/// Exit status to report for a finished command
///
/// Death by signal maps to 128 + signal number, as shells do.
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }
    1
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
