// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for compute context lifecycle and execution events.
//!
//! This module contains message types for logging events related to:
//! * Context construction and closing
//! * Lambda registration (success and failure)
//! * Batch processing lifecycle (start, completion, failure)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Compute context constructed.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct ContextConstructed<'a> {
    pub backend: &'a str,
}

impl Display for ContextConstructed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Compute context constructed with {} runtime", self.backend)
    }
}

impl StructuredLog for ContextConstructed<'_> {
    fn log(&self) {
        tracing::debug!(backend = self.backend, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("context_constructed", span_name = name, backend = self.backend)
    }
}

/// Compute context closed and its runtime released.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct ContextClosed<'a> {
    pub backend: &'a str,
    pub lambda_count: usize,
}

impl Display for ContextClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compute context closed: {} runtime released {} lambdas",
            self.backend, self.lambda_count
        )
    }
}

impl StructuredLog for ContextClosed<'_> {
    fn log(&self) {
        tracing::debug!(backend = self.backend, lambda_count = self.lambda_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "context_closed",
            span_name = name,
            backend = self.backend,
            lambda_count = self.lambda_count,
        )
    }
}

/// Lambda registered successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use palm_compute::observability::messages::context::LambdaRegistered;
///
/// let msg = LambdaRegistered {
///     backend: "lua",
///     lambda_id: 1,
///     program_size: 64,
/// };
///
/// assert_eq!(msg.to_string(), "Lambda 1 registered with lua runtime (64 bytes of program)");
/// ```
pub struct LambdaRegistered<'a> {
    pub backend: &'a str,
    pub lambda_id: i32,
    pub program_size: usize,
}

impl Display for LambdaRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Lambda {} registered with {} runtime ({} bytes of program)",
            self.lambda_id, self.backend, self.program_size
        )
    }
}

impl StructuredLog for LambdaRegistered<'_> {
    fn log(&self) {
        tracing::info!(
            backend = self.backend,
            lambda_id = self.lambda_id,
            program_size = self.program_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "lambda_registered",
            span_name = name,
            backend = self.backend,
            lambda_id = self.lambda_id,
        )
    }
}

/// Lambda registration failed.
///
/// # Log Level
/// `warn!` - The caller receives the error; the context stays usable
pub struct LambdaRegistrationFailed<'a> {
    pub lambda_id: i32,
    pub error: &'a dyn std::error::Error,
}

impl Display for LambdaRegistrationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to register lambda {}: {}", self.lambda_id, self.error)
    }
}

impl StructuredLog for LambdaRegistrationFailed<'_> {
    fn log(&self) {
        tracing::warn!(lambda_id = self.lambda_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "lambda_registration_failed",
            span_name = name,
            lambda_id = self.lambda_id,
            error = %self.error,
        )
    }
}

/// Batch processing started.
///
/// # Log Level
/// `debug!` - Emitted for every batch
pub struct BatchStarted {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub input_size: usize,
}

impl Display for BatchStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch {} started on lambda {}: input_size={} bytes",
            self.batch_id, self.lambda_id, self.input_size
        )
    }
}

impl StructuredLog for BatchStarted {
    fn log(&self) {
        tracing::debug!(
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            input_size = self.input_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch",
            span_name = name,
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            input_size = self.input_size,
        )
    }
}

/// Batch processed successfully.
///
/// # Log Level
/// `debug!` - Emitted for every batch
pub struct BatchCompleted {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub output_size: usize,
    pub duration: std::time::Duration,
}

impl Display for BatchCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch {} completed on lambda {}: output={} bytes, duration={:?}",
            self.batch_id, self.lambda_id, self.output_size, self.duration
        )
    }
}

impl StructuredLog for BatchCompleted {
    fn log(&self) {
        tracing::debug!(
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            output_size = self.output_size,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch_completed",
            span_name = name,
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            duration = ?self.duration,
        )
    }
}

/// Batch processing failed.
///
/// # Log Level
/// `warn!` - The caller receives the error
pub struct BatchFailed<'a> {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub error: &'a dyn std::error::Error,
}

impl Display for BatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch {} failed on lambda {}: {}",
            self.batch_id, self.lambda_id, self.error
        )
    }
}

impl StructuredLog for BatchFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "batch_failed",
            span_name = name,
            lambda_id = self.lambda_id,
            batch_id = self.batch_id,
            error = %self.error,
        )
    }
}
