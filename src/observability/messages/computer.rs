// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the computer worker.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Computer started processing client events.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ComputerStarted {
    pub context_count: usize,
}

impl Display for ComputerStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Computer started with {} compute contexts", self.context_count)
    }
}

impl StructuredLog for ComputerStarted {
    fn log(&self) {
        tracing::info!(context_count = self.context_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("computer", span_name = name, context_count = self.context_count)
    }
}

/// Computer stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ComputerStopped<'a> {
    pub reason: &'a str,
    pub lambda_count: usize,
    pub processed_batches: usize,
}

impl Display for ComputerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computer stopped ({}): {} lambdas registered, {} batches processed",
            self.reason, self.lambda_count, self.processed_batches
        )
    }
}

impl StructuredLog for ComputerStopped<'_> {
    fn log(&self) {
        tracing::info!(
            reason = self.reason,
            lambda_count = self.lambda_count,
            processed_batches = self.processed_batches,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("computer_stopped", span_name = name, reason = self.reason)
    }
}
