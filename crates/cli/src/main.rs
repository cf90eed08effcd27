// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tenure - run commands while holding a distributed lock

mod commands;
mod config;
mod error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::run;
use std::path::PathBuf;
use std::process::ExitCode;
use tenure_adapters::{RedisStore, TracedStore};
use tenure_core::MemoryStore;

use crate::config::Config;
use crate::error::TenureError;

#[derive(Parser)]
#[command(
    name = "tenure",
    version,
    about = "Run commands while holding a distributed lock"
)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/tenure/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Redis server holding the leases
    #[arg(long, global = true, conflicts_with = "memory")]
    redis_url: Option<String>,

    /// Use a process-local lock store instead of Redis
    #[arg(long, global = true)]
    memory: bool,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command while holding a lock
    Run(run::RunArgs),
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => match e.downcast::<TenureError>() {
            Ok(err) => {
                eprint!("{}", err);
                ExitCode::from(err.exit_code)
            }
            Err(e) => {
                eprintln!("error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.redis_url {
        config.redis_url = Some(url);
    }

    match cli.command {
        Commands::Config => commands::config::handle(&config),
        Commands::Run(args) => {
            if cli.memory {
                return run::handle(TracedStore::new(MemoryStore::new()), args, &config).await;
            }
            let url = config.redis_url();
            let store = RedisStore::connect(url)
                .await
                .map_err(|e| TenureError::store_unavailable(url).with_source(e))?;
            run::handle(TracedStore::new(store), args, &config).await
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
