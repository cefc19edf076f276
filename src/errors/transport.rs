// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

/// Failures while exchanging compute messages with a peer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("frame exceeds {max} bytes")]
    FrameTooLong { max: usize },

    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("timed out connecting to {address} after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("no message received from peer within {0:?}")]
    Stale(Duration),

    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("connection is closed")]
    Closed,
}
