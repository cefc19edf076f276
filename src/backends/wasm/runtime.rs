// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use wasmtime::{AsContext, Caller, Engine, ExternType, Instance, Linker, Memory, Module, Store};

use super::engine::create_engine;
use super::error::{WasmError, WasmResult};
use crate::backends::lua::LIBRARY_NAME;
use crate::config::WasmConfig;
use crate::context::LogHub;
use crate::errors::ContextError;
use crate::model::{ComputeBatch, ComputeLambda, ComputeLogEntry};
use crate::traits::LambdaRuntime;

/// Store data for one batch execution.
struct BatchState {
    lambda_id: i32,
    batch_id: i32,
    hub: LogHub,
}

/// Lambda runtime backed by wasmtime. Modules are compiled once at
/// registration and instantiated per batch.
pub struct WasmRuntime {
    engine: Engine,
    modules: HashMap<i32, Module>,
    fuel: u64,
}

impl WasmRuntime {
    pub fn new(config: &WasmConfig) -> Result<Self, ContextError> {
        let engine = create_engine().map_err(|e| ContextError::Construction(e.to_string()))?;
        Ok(Self {
            engine,
            modules: HashMap::new(),
            fuel: config.fuel.effective_fuel(),
        })
    }

    fn linker(&self) -> WasmResult<Linker<BatchState>> {
        let mut linker = Linker::new(&self.engine);
        linker.func_wrap(
            LIBRARY_NAME,
            "log",
            |mut caller: Caller<'_, BatchState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
                let memory = match caller.get_export("memory").and_then(|e| e.into_memory()) {
                    Some(memory) => memory,
                    None => return Err(WasmError::MissingExport("memory").into()),
                };
                let bytes = read_bytes(&memory, &caller, ptr, len)?;
                let state = caller.data();
                state.hub.publish(ComputeLogEntry::new(
                    state.lambda_id,
                    state.batch_id,
                    String::from_utf8_lossy(&bytes).into_owned(),
                ));
                Ok(())
            },
        )?;
        Ok(linker)
    }

    fn execute(&self, module: &Module, batch: &ComputeBatch, hub: &LogHub) -> WasmResult<Option<Vec<u8>>> {
        let mut store = Store::new(
            &self.engine,
            BatchState {
                lambda_id: batch.lambda_id,
                batch_id: batch.batch_id,
                hub: hub.clone(),
            },
        );
        store.set_fuel(self.fuel)?;

        let instance: Instance = self.linker()?.instantiate(&mut store, module)?;
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or(WasmError::MissingExport("memory"))?;
        let allocate = instance
            .get_typed_func::<i32, i32>(&mut store, "allocate")
            .map_err(|_| WasmError::MissingExport("allocate(i32) -> i32"))?;
        let process = instance
            .get_typed_func::<(i32, i32, i32), i32>(&mut store, "process")
            .map_err(|_| WasmError::MissingExport("process(i32, i32, i32) -> i32"))?;

        let input_len = i32::try_from(batch.data.len()).map_err(|_| WasmError::OutOfBounds {
            ptr: 0,
            len: i32::MAX,
        })?;
        let input_ptr = allocate.call(&mut store, input_len)?;
        if input_ptr == 0 {
            return Err(WasmError::NullAllocation("input buffer"));
        }
        memory
            .write(&mut store, input_ptr as usize, &batch.data)
            .map_err(|_| WasmError::OutOfBounds { ptr: input_ptr, len: input_len })?;

        let out_len_ptr = allocate.call(&mut store, 4)?;
        if out_len_ptr == 0 {
            return Err(WasmError::NullAllocation("output length"));
        }

        let result_ptr = process.call(&mut store, (input_ptr, input_len, out_len_ptr))?;
        if result_ptr == 0 {
            return Ok(None);
        }

        let len_bytes = read_bytes(&memory, &store, out_len_ptr, 4)?;
        let output_len = i32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        read_bytes(&memory, &store, result_ptr, output_len).map(Some)
    }
}

fn read_bytes(memory: &Memory, store: impl AsContext, ptr: i32, len: i32) -> WasmResult<Vec<u8>> {
    let out_of_bounds = || WasmError::OutOfBounds { ptr, len };
    let offset = usize::try_from(ptr).map_err(|_| out_of_bounds())?;
    let size = usize::try_from(len).map_err(|_| out_of_bounds())?;
    if size > memory.data_size(&store) {
        return Err(out_of_bounds());
    }
    let mut buffer = vec![0u8; size];
    memory
        .read(&store, offset, &mut buffer)
        .map_err(|_| out_of_bounds())?;
    Ok(buffer)
}

fn validate_module(module: &Module) -> WasmResult<()> {
    let exports = [
        ("memory", "memory"),
        ("allocate", "allocate(i32) -> i32"),
        ("process", "process(i32, i32, i32) -> i32"),
    ];
    for (name, description) in exports {
        match (name, module.get_export(name)) {
            ("memory", Some(ExternType::Memory(_))) => {}
            ("allocate" | "process", Some(ExternType::Func(_))) => {}
            _ => return Err(WasmError::MissingExport(description)),
        }
    }
    for import in module.imports() {
        if import.module() != LIBRARY_NAME || import.name() != "log" {
            return Err(WasmError::UnsupportedImport {
                module: import.module().to_string(),
                name: import.name().to_string(),
            });
        }
    }
    Ok(())
}

impl LambdaRuntime for WasmRuntime {
    fn name(&self) -> &'static str {
        "wasm"
    }

    fn register(&mut self, lambda: &ComputeLambda) -> Result<(), ContextError> {
        let lambda_id = lambda.lambda_id;
        let module = Module::new(&self.engine, lambda.program.as_bytes()).map_err(|e| {
            ContextError::Compile {
                lambda_id,
                message: WasmError::ModuleError(e.to_string()).to_string(),
            }
        })?;
        validate_module(&module).map_err(|e| ContextError::NotRegistered {
            lambda_id,
            reason: e.to_string(),
        })?;
        self.modules.insert(lambda_id, module);
        Ok(())
    }

    fn process(&mut self, batch: &ComputeBatch, log: &LogHub) -> Result<Vec<u8>, ContextError> {
        let lambda_id = batch.lambda_id;
        let batch_id = batch.batch_id;
        let module = self
            .modules
            .get(&lambda_id)
            .ok_or(ContextError::UnknownLambda { lambda_id })?;

        match self.execute(module, batch, log) {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(ContextError::NoOutput { lambda_id, batch_id }),
            Err(WasmError::OutOfFuel) => Err(ContextError::BudgetExhausted { lambda_id, batch_id }),
            Err(e) => Err(ContextError::Runtime {
                lambda_id,
                batch_id,
                message: e.to_string(),
            }),
        }
    }

    fn unregister(&mut self, lambda_id: i32) -> bool {
        self.modules.remove(&lambda_id).is_some()
    }

    fn lambda_count(&self) -> usize {
        self.modules.len()
    }
}
