// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod client;
pub mod runtime;

pub use client::{ClientEvent, ComputeClient};
pub use runtime::LambdaRuntime;
