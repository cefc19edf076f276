// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for compute services, clients and computers.
///
/// Every section is optional; a missing section takes its defaults.
///
/// # Example
/// ```yaml
/// context:
///   backend: lua
///   lua:
///     instruction_limit: 100000000
/// service:
///   port: 62001
///   lambdas:
///     - id: 1
///       program: |
///         lcm:register(function (batch) return batch:upper() end)
///   batches:
///     - lambda_id: 1
///       batch_id: 100
///       data: "hello"
/// computer:
///   threads: 4
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub computer: ComputerConfig,
}

/// Lambda runtime hosted by a compute context.
#[derive(Debug, Default, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Embedded Lua 5.4 with the `lcm` library
    #[default]
    Lua,
    /// WebAssembly modules executed by wasmtime
    Wasm,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lua" => Ok(BackendType::Lua),
            "wasm" => Ok(BackendType::Wasm),
            other => Err(format!("unknown backend '{}' (expected lua or wasm)", other)),
        }
    }
}

/// Settings applied to every compute context.
#[derive(Debug, Deserialize, Clone)]
pub struct ContextConfig {
    #[serde(default)]
    pub backend: BackendType,
    #[serde(default)]
    pub lua: LuaConfig,
    #[serde(default)]
    pub wasm: WasmConfig,
    pub max_payload_bytes: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::Lua,
            lua: LuaConfig::default(),
            wasm: WasmConfig::default(),
            max_payload_bytes: None,
        }
    }
}

impl ContextConfig {
    pub fn with_backend(backend: BackendType) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn get_max_payload_bytes(&self) -> usize {
        self.max_payload_bytes.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES)
    }
}

/// Lua interpreter limits.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct LuaConfig {
    /// Instructions one `register` or `process` call may execute
    pub instruction_limit: Option<u64>,
    /// Bytes the interpreter state may allocate
    pub memory_limit_bytes: Option<usize>,
}

impl LuaConfig {
    pub fn get_instruction_limit(&self) -> u64 {
        self.instruction_limit.unwrap_or(DEFAULT_LUA_INSTRUCTION_LIMIT)
    }

    pub fn get_memory_limit(&self) -> usize {
        self.memory_limit_bytes.unwrap_or(DEFAULT_LUA_MEMORY_LIMIT)
    }
}

/// WASM-specific configuration options.
///
/// # Example
/// ```yaml
/// wasm:
///   fuel:
///     default: 100000000
///     minimum: 1000000
///     maximum: 500000000
/// ```
#[derive(Debug, Default, Deserialize, Clone)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
}

/// Fuel consumption configuration for WASM execution.
///
/// Fuel limits prevent infinite loops and resource exhaustion by limiting the number
/// of instructions a WASM module can execute.
///
/// # Fields
/// * `default` - Fuel given to every batch (defaults to 100M)
/// * `minimum` - Minimum allowed fuel level (defaults to 1M)
/// * `maximum` - Maximum allowed fuel level (defaults to 500M) - security limit
#[derive(Debug, Default, Deserialize, Clone)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Fuel handed to each batch: the default level clamped to `[minimum, maximum]`.
    ///
    /// ```
    /// use palm_compute::config::FuelConfig;
    ///
    /// let config = FuelConfig { default: Some(1_000_000_000), minimum: None, maximum: None };
    /// assert_eq!(config.effective_fuel(), 500_000_000);
    /// ```
    pub fn effective_fuel(&self) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum();
        let requested = self.get_default();
        if requested < min || requested > max {
            tracing::warn!(requested, min, max, "WASM fuel level out of bounds, clamping");
        }
        requested.clamp(min, max.max(min))
    }
}

/// Shared connection timing for services and clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionOptions {
    /// Silence after which a connection is disrupted
    pub timeout: Duration,
    /// Interval between keepalive frames
    pub keepalive_interval: Duration,
    pub max_frame_bytes: usize,
}

impl ConnectionOptions {
    /// Keepalives are sent at 90% of the timeout, and never more often than
    /// every millisecond.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            keepalive_interval: timeout
                .mul_f64(0.9)
                .max(Duration::from_millis(MIN_KEEPALIVE_INTERVAL_MS)),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::with_timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

/// Compute service (listener) settings.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub timeout_ms: Option<u64>,
    pub max_frame_bytes: Option<usize>,
    /// Lambdas submitted to every client that connects
    #[serde(default)]
    pub lambdas: Vec<LambdaSeed>,
    /// Batches submitted to every client after the lambdas
    #[serde(default)]
    pub batches: Vec<BatchSeed>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            timeout_ms: None,
            max_frame_bytes: None,
            lambdas: Vec::new(),
            batches: Vec::new(),
        }
    }
}

impl ServiceConfig {
    pub fn connection_options(&self) -> ConnectionOptions {
        connection_options(self.timeout_ms, self.max_frame_bytes)
    }
}

/// A lambda the service hands out.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LambdaSeed {
    pub id: i32,
    pub program: String,
}

/// A batch the service hands out. `data` is sent as UTF-8 bytes.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BatchSeed {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub data: String,
}

/// Compute client settings.
#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub max_frame_bytes: Option<usize>,
}

impl ClientConfig {
    pub fn connection_options(&self) -> ConnectionOptions {
        connection_options(self.timeout_ms, self.max_frame_bytes)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

/// Computer worker settings.
#[derive(Debug, Default, Deserialize)]
pub struct ComputerConfig {
    /// Number of compute contexts; defaults to the available parallelism
    pub threads: Option<usize>,
}

impl ComputerConfig {
    pub fn get_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_SERVICE_PORT
}

fn connection_options(timeout_ms: Option<u64>, max_frame_bytes: Option<usize>) -> ConnectionOptions {
    let mut options =
        ConnectionOptions::with_timeout(Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)));
    if let Some(max) = max_frame_bytes {
        options.max_frame_bytes = max;
    }
    options
}

/// Parse a config from YAML text
pub fn parse_yaml(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Parse a config from TOML text
pub fn parse_toml(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load a config file, choosing the format from its extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => parse_yaml(&content),
        Some("toml") => parse_toml(&content),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or_default().to_string(),
        )),
    }
}

/// Load and validate a config file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_keeps_a_positive_keepalive_interval() {
        let options = ConnectionOptions::with_timeout(Duration::ZERO);

        assert_eq!(options.timeout, Duration::ZERO);
        assert_eq!(options.keepalive_interval, Duration::from_millis(MIN_KEEPALIVE_INTERVAL_MS));
        assert_eq!(
            ConnectionOptions::with_timeout(Duration::from_secs(10)).keepalive_interval,
            Duration::from_secs(9)
        );
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let cfg = parse_yaml("{}").unwrap();

        assert_eq!(cfg.context.backend, BackendType::Lua);
        assert_eq!(cfg.context.lua.get_instruction_limit(), DEFAULT_LUA_INSTRUCTION_LIMIT);
        assert_eq!(cfg.context.get_max_payload_bytes(), DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(cfg.service.port, DEFAULT_SERVICE_PORT);
        assert_eq!(cfg.service.bind_address, "0.0.0.0");
        assert_eq!(cfg.client.connect_timeout(), Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS));
        assert!(cfg.service.lambdas.is_empty());
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
context:
  backend: wasm
  wasm:
    fuel:
      default: 2000000
service:
  port: 7000
  timeout_ms: 1000
  lambdas:
    - id: 1
      program: "lcm:register(function (b) return b end)"
  batches:
    - lambda_id: 1
      batch_id: 5
      data: hello
"#;

        let cfg = parse_yaml(yaml).unwrap();
        assert_eq!(cfg.context.backend, BackendType::Wasm);
        assert_eq!(cfg.context.wasm.fuel.effective_fuel(), 2_000_000);
        assert_eq!(cfg.service.port, 7000);
        assert_eq!(cfg.service.lambdas.len(), 1);
        assert_eq!(cfg.service.batches[0].batch_id, 5);

        let options = cfg.service.connection_options();
        assert_eq!(options.timeout, Duration::from_millis(1000));
        assert_eq!(options.keepalive_interval, Duration::from_millis(900));
    }

    #[test]
    fn parse_unknown_backend_fails() {
        assert!(parse_yaml("context:\n  backend: python\n").is_err());
        assert!("python".parse::<BackendType>().is_err());
        assert_eq!("wasm".parse::<BackendType>(), Ok(BackendType::Wasm));
    }

    #[test]
    fn fuel_is_clamped_to_bounds() {
        let low = FuelConfig { default: Some(10), minimum: None, maximum: None };
        assert_eq!(low.effective_fuel(), MIN_FUEL_LEVEL);

        let high = FuelConfig { default: Some(u64::MAX), minimum: None, maximum: Some(5_000_000) };
        assert_eq!(high.effective_fuel(), 5_000_000);
    }
}
