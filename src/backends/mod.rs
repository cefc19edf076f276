// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lambda runtime backends.
//!
//! Each backend implements [`LambdaRuntime`](crate::traits::LambdaRuntime) and
//! is hosted by a [`ComputeContext`](crate::context::ComputeContext).
//!
//! # Available Backends
//!
//! ## Lua Backend (default)
//! Lua 5.4 programs that call `lcm:register(fn)` to hand over their batch
//! function and `lcm:log(msg)` to emit log entries.
//!
//! ## WASM Backend
//! Core WebAssembly modules using the C-style `allocate` / `process` ABI,
//! executed under wasmtime with fuel limits.
//!
//! ## Stub Backend (Test-Only)
//! - **EchoRuntime**: returns every batch unchanged
//! - **PickyRuntime**: an echo runtime that refuses some programs
//! - **PanickingRuntime**: panics while processing, for lock recovery tests
//!
//! # Examples
//!
//! ```rust
//! use palm_compute::config::{BackendType, ContextConfig};
//! use palm_compute::context::ComputeContext;
//! use palm_compute::model::{ComputeBatch, ComputeLambda};
//!
//! let context = ComputeContext::from_config(&ContextConfig::with_backend(BackendType::Lua))?;
//! context.register(&ComputeLambda::new(1, "lcm:register(function (b) return b:upper() end)"))?;
//!
//! let output = context.process(&ComputeBatch::new(1, 1, b"hi".to_vec()))?;
//! assert_eq!(output.data, b"HI");
//! # Ok::<(), palm_compute::model::ComputeError>(())
//! ```

pub mod lua;
#[cfg(test)]
pub mod stub;
pub mod wasm;
