// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::lua::LuaRuntime;
use crate::backends::wasm::WasmRuntime;
use crate::config::{BackendType, ContextConfig};
use crate::errors::ContextError;
use crate::traits::LambdaRuntime;

/// Builds lambda runtimes from configuration.
pub struct RuntimeFactory;

impl RuntimeFactory {
    pub fn create_runtime(config: &ContextConfig) -> Result<Box<dyn LambdaRuntime>, ContextError> {
        match config.backend {
            BackendType::Lua => Ok(Box::new(LuaRuntime::new(&config.lua)?)),
            BackendType::Wasm => Ok(Box::new(WasmRuntime::new(&config.wasm)?)),
        }
    }
}
