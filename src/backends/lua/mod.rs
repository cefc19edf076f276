// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Embedded Lua 5.4 lambda runtime.
//!
//! A lambda program is a Lua chunk that hands its batch function to the host
//! through the `lcm` library:
//!
//! ```lua
//! lcm:register(function (batch)
//!   lcm:log("processing " .. #batch .. " bytes")
//!   return batch:upper()
//! end)
//! ```
//!
//! The batch function receives the payload as a Lua string and must return a
//! string. Returning `nil` means the lambda produced no output.
//!
//! ## Sandbox
//! - Only the `string`, `table`, `math` and `utf8` libraries are opened;
//!   `dofile` and `loadfile` are removed from the base library
//! - `load` accepts source text only and `string.dump` is removed
//! - Every `register` and `process` call runs under an instruction budget.
//!   `pcall` and `xpcall` re-raise once it is spent
//! - The interpreter state has a memory limit

mod library;
mod runtime;

pub use library::LIBRARY_NAME;
pub use runtime::LuaRuntime;
