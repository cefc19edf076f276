// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its level.
//!
//! * `context` - lambda registration and batch execution events
//! * `transport` - connection lifecycle and framing events
//! * `computer` - computer worker events

use tracing::Span;

pub mod computer;
pub mod context;
pub mod transport;

/// A log message that knows its level and its structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
