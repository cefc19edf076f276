// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::context::LogHub;
use crate::errors::ContextError;
use crate::model::{ComputeBatch, ComputeLambda};

/// A script engine able to hold registered lambdas and run them on batches.
///
/// Runtimes are not reentrant: every method takes `&mut self` and the owning
/// [`ComputeContext`](crate::context::ComputeContext) serializes all calls.
pub trait LambdaRuntime: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Compile `lambda.program` and store it under `lambda.lambda_id`,
    /// replacing any earlier program with that id. On error nothing changes.
    fn register(&mut self, lambda: &ComputeLambda) -> Result<(), ContextError>;

    /// Run the lambda identified by `batch.lambda_id` on `batch.data`,
    /// publishing any log entries the program emits to `log`.
    fn process(&mut self, batch: &ComputeBatch, log: &LogHub) -> Result<Vec<u8>, ContextError>;

    /// Drop the program stored under `lambda_id`. Returns whether one existed.
    fn unregister(&mut self, lambda_id: i32) -> bool;

    /// Number of lambdas currently registered.
    fn lambda_count(&self) -> usize;
}
