// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel errors

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel: already closed")]
    Closed,
    /// Some subscribers had no room; the others received the message
    #[error("channel: {missed} subscriber queue(s) full")]
    Full { missed: usize },
    #[error("channel: capacity must be greater than zero")]
    ZeroCapacity,
    #[error("channel: worker count must be greater than zero")]
    ZeroWorkers,
    #[error("channel: submit cancelled")]
    Cancelled,
}
