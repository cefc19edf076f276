// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compute contexts: a lambda runtime, its lifecycle and its log stream.
//!
//! ```text
//! Uninitialized --new/from_config--> Ready --close--> Closed
//!                                      ^                |
//!                                      +-- register ----+ (Closed: every call fails)
//!                                          process
//! ```
//!
//! Construction either produces a `Ready` context or fails, so a context is
//! never observed before it is ready.

mod compute_context;
mod factory;
mod log_hub;

#[cfg(test)]
mod integration_tests;

pub use compute_context::{ComputeContext, ContextState};
pub use factory::RuntimeFactory;
pub use log_hub::{LogHub, LogSubscription};
