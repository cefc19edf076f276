// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::context::LogHub;
use crate::errors::ContextError;
use crate::model::{ComputeBatch, ComputeLambda, ComputeLogEntry};
use crate::traits::LambdaRuntime;

/// Accepts any program and echoes batches back, logging the program text.
#[derive(Default)]
pub struct EchoRuntime {
    programs: HashMap<i32, String>,
}

impl LambdaRuntime for EchoRuntime {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn register(&mut self, lambda: &ComputeLambda) -> Result<(), ContextError> {
        if lambda.program.is_empty() {
            return Err(ContextError::Compile {
                lambda_id: lambda.lambda_id,
                message: "empty program".to_string(),
            });
        }
        self.programs.insert(lambda.lambda_id, lambda.program.clone());
        Ok(())
    }

    fn process(&mut self, batch: &ComputeBatch, log: &LogHub) -> Result<Vec<u8>, ContextError> {
        let program = self.programs.get(&batch.lambda_id).ok_or(ContextError::UnknownLambda {
            lambda_id: batch.lambda_id,
        })?;
        log.publish(ComputeLogEntry::new(batch.lambda_id, batch.batch_id, program.as_str()));
        Ok(batch.data.clone())
    }

    fn unregister(&mut self, lambda_id: i32) -> bool {
        self.programs.remove(&lambda_id).is_some()
    }

    fn lambda_count(&self) -> usize {
        self.programs.len()
    }
}

/// Like [`EchoRuntime`], but refuses programs containing "reject".
#[derive(Default)]
pub struct PickyRuntime {
    echo: EchoRuntime,
}

impl LambdaRuntime for PickyRuntime {
    fn name(&self) -> &'static str {
        "picky"
    }

    fn register(&mut self, lambda: &ComputeLambda) -> Result<(), ContextError> {
        if lambda.program.contains("reject") {
            return Err(ContextError::Compile {
                lambda_id: lambda.lambda_id,
                message: "program refused".to_string(),
            });
        }
        self.echo.register(lambda)
    }

    fn process(&mut self, batch: &ComputeBatch, log: &LogHub) -> Result<Vec<u8>, ContextError> {
        self.echo.process(batch, log)
    }

    fn unregister(&mut self, lambda_id: i32) -> bool {
        self.echo.unregister(lambda_id)
    }

    fn lambda_count(&self) -> usize {
        self.echo.lambda_count()
    }
}

/// Panics on every batch.
#[derive(Default)]
pub struct PanickingRuntime;

impl LambdaRuntime for PanickingRuntime {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn register(&mut self, _lambda: &ComputeLambda) -> Result<(), ContextError> {
        Ok(())
    }

    fn process(&mut self, _batch: &ComputeBatch, _log: &LogHub) -> Result<Vec<u8>, ContextError> {
        panic!("simulated runtime panic");
    }

    fn unregister(&mut self, _lambda_id: i32) -> bool {
        false
    }

    fn lambda_count(&self) -> usize {
        0
    }
}
