// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use wasmtime::{Config, Engine};

use super::error::{WasmError, WasmResult};

/// Builds the sandboxed engine shared by every module of one runtime.
pub fn create_engine() -> WasmResult<Engine> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    // Epoch interruption raises spurious "interrupt" traps when left on.
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmError::EngineError(e.to_string()))
}
