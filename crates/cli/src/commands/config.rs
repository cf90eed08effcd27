// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tenure config` - Print the effective configuration

use crate::config::Config;
use anyhow::Result;
use std::process::ExitCode;

pub fn handle(config: &Config) -> Result<ExitCode> {
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
