// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for WASM backend operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WasmError {
    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    EngineError(String),

    /// Module compilation error.
    #[error("WASM module error: {0}")]
    ModuleError(String),

    /// A required export is missing or has the wrong kind.
    #[error("WASM module must export {0}")]
    MissingExport(&'static str),

    /// The module imports something other than the `lcm` library.
    #[error("Unsupported import {module}.{name}")]
    UnsupportedImport { module: String, name: String },

    /// `allocate` returned a null pointer.
    #[error("Failed to allocate {0}")]
    NullAllocation(&'static str),

    /// Memory access outside valid bounds.
    #[error("Memory access out of bounds: {len} bytes at {ptr}")]
    OutOfBounds { ptr: i32, len: i32 },

    /// The store ran out of fuel.
    #[error("WASM execution ran out of fuel")]
    OutOfFuel,

    /// Wasmtime runtime execution error.
    #[error("WASM execution error: {0}")]
    ExecutionError(wasmtime::Error),
}

impl From<wasmtime::Error> for WasmError {
    fn from(error: wasmtime::Error) -> Self {
        match error.downcast_ref::<wasmtime::Trap>() {
            Some(wasmtime::Trap::OutOfFuel) => WasmError::OutOfFuel,
            _ => WasmError::ExecutionError(error),
        }
    }
}

pub type WasmResult<T> = Result<T, WasmError>;
