/// Default fuel level for WASM execution (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Default Lua instruction budget per call (100 million instructions)
pub const DEFAULT_LUA_INSTRUCTION_LIMIT: u64 = 100_000_000;
/// Default memory limit for a Lua state (64 MiB)
pub const DEFAULT_LUA_MEMORY_LIMIT: usize = 64 * 1024 * 1024;
/// Instructions executed between two budget checks
pub const LUA_HOOK_INTERVAL: u32 = 1_000;

/// Largest batch payload a context accepts (10 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Wire protocol version written in every frame
pub const PROTOCOL_VERSION: u32 = 1;
/// Largest accepted frame (16 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
/// Duration after which a silent connection is considered stale
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Shortest keepalive interval a connection will use
pub const MIN_KEEPALIVE_INTERVAL_MS: u64 = 1;
/// Time allowed for a client to establish its connection
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;
/// Default service port
pub const DEFAULT_SERVICE_PORT: u16 = 62_001;
