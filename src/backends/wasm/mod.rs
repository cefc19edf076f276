// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WebAssembly lambda runtime.
//!
//! A lambda program is a core WebAssembly module, either as text (WAT) or as a
//! binary, using the C-style calling convention:
//!
//! | Export     | Signature                                    |
//! |------------|----------------------------------------------|
//! | `memory`   | linear memory                                |
//! | `allocate` | `(size: i32) -> i32`                         |
//! | `process`  | `(ptr: i32, len: i32, out_len_ptr: i32) -> i32` |
//!
//! `process` writes the output length to `out_len_ptr` and returns a pointer
//! to the output bytes, or `0` when it has no output.
//!
//! The only import a module may declare is `lcm.log(ptr: i32, len: i32)`,
//! which publishes the UTF-8 text at `ptr` as a log entry of the current batch.
//!
//! ## Sandbox
//! - Each batch runs in a fresh instance with its own store
//! - Execution is fuel-limited; running out of fuel is a budget error
//! - Threads, SIMD, multi-memory and memory64 are disabled

mod engine;
mod error;
mod runtime;

pub use engine::create_engine;
pub use error::{WasmError, WasmResult};
pub use runtime::WasmRuntime;
