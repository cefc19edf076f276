// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use mlua::{ChunkMode, Function, HookTriggers, Lua, LuaOptions, StdLib, Value, VmState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::library::{self, ActiveBatch, PendingRegistration};
use crate::config::consts::LUA_HOOK_INTERVAL;
use crate::config::LuaConfig;
use crate::context::LogHub;
use crate::errors::ContextError;
use crate::model::{ComputeBatch, ComputeLambda};
use crate::traits::LambdaRuntime;

const BUDGET_EXHAUSTED_MESSAGE: &str = "instruction budget exhausted";

/// Lambda runtime backed by one Lua state.
pub struct LuaRuntime {
    lua: Lua,
    lambdas: HashMap<i32, Function>,
    instruction_limit: u64,
    /// Instructions left for the call in progress, decremented by the hook.
    budget: Arc<AtomicU64>,
}

impl LuaRuntime {
    pub fn new(config: &LuaConfig) -> Result<Self, ContextError> {
        let construction = |e: mlua::Error| ContextError::Construction(e.to_string());

        // No coroutine library: the instruction hook only watches the main thread.
        let libs = StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8;
        let lua = Lua::new_with(libs, LuaOptions::default()).map_err(construction)?;
        lua.set_memory_limit(config.get_memory_limit())
            .map_err(construction)?;

        let globals = lua.globals();
        for name in ["dofile", "loadfile"] {
            globals.set(name, Value::Nil).map_err(construction)?;
        }
        library::install(&lua).map_err(construction)?;

        let instruction_limit = config.get_instruction_limit();
        let budget = Arc::new(AtomicU64::new(instruction_limit));
        library::install_guards(&lua, Arc::clone(&budget), BUDGET_EXHAUSTED_MESSAGE)
            .map_err(construction)?;

        let hook_budget = Arc::clone(&budget);
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(LUA_HOOK_INTERVAL),
            move |_lua, _debug| {
                let step = u64::from(LUA_HOOK_INTERVAL);
                let remaining = hook_budget.load(Ordering::Relaxed);
                if remaining <= step {
                    hook_budget.store(0, Ordering::Relaxed);
                    return Err(mlua::Error::runtime(BUDGET_EXHAUSTED_MESSAGE));
                }
                hook_budget.store(remaining - step, Ordering::Relaxed);
                Ok(VmState::Continue)
            },
        );

        Ok(Self {
            lua,
            lambdas: HashMap::new(),
            instruction_limit,
            budget,
        })
    }

    fn arm_budget(&self) {
        self.budget.store(self.instruction_limit, Ordering::Relaxed);
    }

    fn budget_exhausted(&self) -> bool {
        self.budget.load(Ordering::Relaxed) == 0
    }
}

impl LambdaRuntime for LuaRuntime {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn register(&mut self, lambda: &ComputeLambda) -> Result<(), ContextError> {
        let lambda_id = lambda.lambda_id;
        let program = self
            .lua
            .load(lambda.program.as_str())
            .set_name(format!("=lambda-{lambda_id}"))
            .set_mode(ChunkMode::Text)
            .into_function()
            .map_err(|e| ContextError::Compile {
                lambda_id,
                message: e.to_string(),
            })?;

        self.arm_budget();
        self.lua.set_app_data(PendingRegistration::default());
        let outcome = program.call::<()>(());
        let pending = self.lua.remove_app_data::<PendingRegistration>();

        if self.budget_exhausted() {
            return Err(ContextError::Load {
                lambda_id,
                message: BUDGET_EXHAUSTED_MESSAGE.to_string(),
            });
        }
        if let Err(e) = outcome {
            return Err(ContextError::Load {
                lambda_id,
                message: e.to_string(),
            });
        }

        let function = pending
            .and_then(|p| p.function)
            .ok_or_else(|| ContextError::NotRegistered {
                lambda_id,
                reason: "program finished without calling lcm:register".to_string(),
            })?;
        self.lambdas.insert(lambda_id, function);
        Ok(())
    }

    fn process(&mut self, batch: &ComputeBatch, log: &LogHub) -> Result<Vec<u8>, ContextError> {
        let lambda_id = batch.lambda_id;
        let batch_id = batch.batch_id;
        let function = self
            .lambdas
            .get(&lambda_id)
            .cloned()
            .ok_or(ContextError::UnknownLambda { lambda_id })?;

        let runtime_fault = |e: mlua::Error| ContextError::Runtime {
            lambda_id,
            batch_id,
            message: e.to_string(),
        };
        let input = self.lua.create_string(&batch.data).map_err(runtime_fault)?;

        self.arm_budget();
        self.lua.set_app_data(ActiveBatch {
            lambda_id,
            batch_id,
            hub: log.clone(),
        });
        let outcome = function.call::<Value>(input);
        self.lua.remove_app_data::<ActiveBatch>();

        if self.budget_exhausted() {
            return Err(ContextError::BudgetExhausted { lambda_id, batch_id });
        }
        match outcome {
            Ok(Value::String(output)) => Ok(output.as_bytes().to_vec()),
            Ok(Value::Nil) => Err(ContextError::NoOutput { lambda_id, batch_id }),
            Ok(other) => Err(ContextError::InvalidOutput {
                lambda_id,
                batch_id,
                type_name: other.type_name().to_string(),
            }),
            Err(e) => Err(runtime_fault(e)),
        }
    }

    fn unregister(&mut self, lambda_id: i32) -> bool {
        self.lambdas.remove(&lambda_id).is_some()
    }

    fn lambda_count(&self) -> usize {
        self.lambdas.len()
    }
}
