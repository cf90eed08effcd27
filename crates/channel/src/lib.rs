// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tenure-channel: in-process messaging and task execution
//!
//! - [`Broker`] fans every message out to bounded subscriber queues
//! - [`TaskPool`] runs submitted futures on a fixed set of workers fed by a
//!   bounded queue

pub mod broker;
pub mod error;
pub mod task_pool;

pub use broker::Broker;
pub use error::ChannelError;
pub use task_pool::TaskPool;
