// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for the diagnostic and operational
//! logging of palm-compute. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep log field names consistent between call sites
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::context` - Lambda registration and batch execution events
//! * `messages::transport` - Service/client connection lifecycle and framing
//! * `messages::computer` - Computer worker events
//!
//! # Usage
//!
//! ```rust
//! use palm_compute::observability::messages::context::LambdaRegistered;
//! use palm_compute::observability::messages::StructuredLog;
//!
//! LambdaRegistered {
//!     backend: "lua",
//!     lambda_id: 1,
//!     program_size: 64,
//! }
//! .log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `fmt` subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed (tests, embedding applications).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
