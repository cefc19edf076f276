// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, parse_toml, parse_yaml, BackendType, BatchSeed,
    ClientConfig, ComputerConfig, Config, ConnectionOptions, ContextConfig, FuelConfig,
    LambdaSeed, LuaConfig, ServiceConfig, WasmConfig,
};
pub use validation::validate_config;
