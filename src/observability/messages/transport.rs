// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for compute service and client connections.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Listener bound and accepting connections.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ListenerStarted<'a> {
    pub address: &'a str,
}

impl Display for ListenerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Compute service listening on {}", self.address)
    }
}

impl StructuredLog for ListenerStarted<'_> {
    fn log(&self) {
        tracing::info!(address = self.address, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("listener", span_name = name, address = self.address)
    }
}

/// A connection changed status.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionStatusChanged<'a> {
    pub role: &'a str,
    pub peer: &'a str,
    pub status: &'a str,
}

impl Display for ConnectionStatusChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} connection to {} is now {}", self.role, self.peer, self.status)
    }
}

impl StructuredLog for ConnectionStatusChanged<'_> {
    fn log(&self) {
        tracing::info!(role = self.role, peer = self.peer, status = self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "connection",
            span_name = name,
            role = self.role,
            peer = self.peer,
        )
    }
}

/// A frame could not be read, decoded or written.
///
/// # Log Level
/// `warn!` - The connection keeps going
pub struct FrameFailed<'a> {
    pub role: &'a str,
    pub peer: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FrameFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} connection to {}: frame failed: {}", self.role, self.peer, self.error)
    }
}

impl StructuredLog for FrameFailed<'_> {
    fn log(&self) {
        tracing::warn!(role = self.role, peer = self.peer, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "frame_failed",
            span_name = name,
            role = self.role,
            peer = self.peer,
            error = %self.error,
        )
    }
}
