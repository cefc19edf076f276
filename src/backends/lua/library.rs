// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The `lcm` table exposed to lambda programs.

use mlua::{ChunkMode, Function, Lua, Table};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::LogHub;
use crate::model::ComputeLogEntry;

/// Global name of the host library.
pub const LIBRARY_NAME: &str = "lcm";

/// Present in app data while a program is being registered.
#[derive(Default)]
pub(super) struct PendingRegistration {
    pub function: Option<Function>,
}

/// Present in app data while a batch is being processed.
pub(super) struct ActiveBatch {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub hub: LogHub,
}

pub(super) fn install(lua: &Lua) -> mlua::Result<()> {
    let lcm = lua.create_table()?;
    lcm.set("register", lua.create_function(register)?)?;
    lcm.set("log", lua.create_function(log)?)?;
    lua.globals().set(LIBRARY_NAME, lcm)?;
    Ok(())
}

/// Rewrites base functions a lambda could use to escape the sandbox.
///
/// `pcall` and `xpcall` re-raise once the budget is spent, so an exhausted
/// call unwinds to the host however deeply it is nested. `load` only accepts
/// source text and `string.dump` is removed.
const GUARDS: &str = r#"
local exhausted, exhausted_message = ...
local raw_pcall, raw_xpcall, raw_load, raw_error = pcall, xpcall, load, error

local function rethrow(...)
  if exhausted() then
    raw_error(exhausted_message, 0)
  end
  return ...
end

pcall = function(...) return rethrow(raw_pcall(...)) end
xpcall = function(...) return rethrow(raw_xpcall(...)) end
load = function(chunk, name, _, ...) return raw_load(chunk, name, "t", ...) end
string.dump = nil
"#;

pub(super) fn install_guards(
    lua: &Lua,
    budget: Arc<AtomicU64>,
    exhausted_message: &str,
) -> mlua::Result<()> {
    let exhausted = lua.create_function(move |_, ()| Ok(budget.load(Ordering::Relaxed) == 0))?;
    lua.load(GUARDS)
        .set_name("=guards")
        .set_mode(ChunkMode::Text)
        .call::<()>((exhausted, exhausted_message))
}

/// `lcm:register(fn)`
fn register(lua: &Lua, (_lcm, function): (Table, Function)) -> mlua::Result<()> {
    let mut pending = lua.app_data_mut::<PendingRegistration>().ok_or_else(|| {
        mlua::Error::runtime("lcm:register may only be called while a program is being registered")
    })?;
    pending.function = Some(function);
    Ok(())
}

/// `lcm:log(message)`
fn log(lua: &Lua, (_lcm, message): (Table, mlua::String)) -> mlua::Result<()> {
    let message = String::from(message.to_string_lossy());
    match lua.app_data_ref::<ActiveBatch>() {
        Some(active) => active.hub.publish(ComputeLogEntry::new(
            active.lambda_id,
            active.batch_id,
            message,
        )),
        None => tracing::debug!(message = %message, "lcm:log called outside of batch processing"),
    }
    Ok(())
}
