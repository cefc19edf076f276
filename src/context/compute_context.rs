// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::factory::RuntimeFactory;
use super::log_hub::{LogHub, LogSubscription};
use crate::config::consts::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::config::ContextConfig;
use crate::errors::ContextError;
use crate::model::{ComputeBatch, ComputeError, ComputeLambda};
use crate::observability::messages::context::{
    BatchCompleted, BatchFailed, BatchStarted, ContextClosed, ContextConstructed,
    LambdaRegistered, LambdaRegistrationFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::LambdaRuntime;

/// Observable lifecycle state of a [`ComputeContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Ready,
    Closed,
}

enum Lifecycle {
    Ready(Box<dyn LambdaRuntime>),
    Closed,
}

/// An execution context hosting one lambda runtime.
///
/// All operations take `&self`; `register` and `process` are serialized by a
/// single lock, so a context can be shared between threads. The lock is
/// recovered if a runtime panics while holding it.
pub struct ComputeContext {
    lifecycle: Mutex<Lifecycle>,
    log_hub: LogHub,
    backend: &'static str,
    max_payload_bytes: usize,
}

impl ComputeContext {
    pub fn new(runtime: Box<dyn LambdaRuntime>) -> Self {
        Self::with_max_payload(runtime, DEFAULT_MAX_PAYLOAD_BYTES)
    }

    pub fn with_max_payload(runtime: Box<dyn LambdaRuntime>, max_payload_bytes: usize) -> Self {
        let backend = runtime.name();
        ContextConstructed { backend }.log();
        Self {
            lifecycle: Mutex::new(Lifecycle::Ready(runtime)),
            log_hub: LogHub::new(),
            backend,
            max_payload_bytes,
        }
    }

    /// Creates a context hosting the backend selected by `config`.
    pub fn from_config(config: &ContextConfig) -> Result<Self, ComputeError> {
        let runtime = RuntimeFactory::create_runtime(config)?;
        Ok(Self::with_max_payload(runtime, config.get_max_payload_bytes()))
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compiles `lambda` and stores it under its id, replacing any earlier
    /// program with the same id. A failed registration changes nothing.
    pub fn register(&self, lambda: &ComputeLambda) -> Result<(), ComputeError> {
        let mut lifecycle = self.lock();
        let runtime = match &mut *lifecycle {
            Lifecycle::Ready(runtime) => runtime,
            Lifecycle::Closed => return Err(ContextError::Closed.into()),
        };

        match runtime.register(lambda) {
            Ok(()) => {
                LambdaRegistered {
                    backend: self.backend,
                    lambda_id: lambda.lambda_id,
                    program_size: lambda.program.len(),
                }
                .log();
                Ok(())
            }
            Err(e) => {
                LambdaRegistrationFailed {
                    lambda_id: lambda.lambda_id,
                    error: &e,
                }
                .log();
                Err(e.into())
            }
        }
    }

    /// Runs the lambda named by `batch.lambda_id` on the batch payload. The
    /// output batch keeps the ids of `batch`.
    pub fn process(&self, batch: &ComputeBatch) -> Result<ComputeBatch, ComputeError> {
        let mut lifecycle = self.lock();
        let runtime = match &mut *lifecycle {
            Lifecycle::Ready(runtime) => runtime,
            Lifecycle::Closed => return Err(ContextError::Closed.into()),
        };

        let started = BatchStarted {
            lambda_id: batch.lambda_id,
            batch_id: batch.batch_id,
            input_size: batch.data.len(),
        };
        let _span = started.span("process").entered();
        started.log();

        let start = Instant::now();
        let outcome = if batch.data.len() > self.max_payload_bytes {
            Err(ContextError::PayloadTooLarge {
                batch_id: batch.batch_id,
                size: batch.data.len(),
                max: self.max_payload_bytes,
            })
        } else {
            runtime.process(batch, &self.log_hub)
        };

        match outcome {
            Ok(output) => {
                BatchCompleted {
                    lambda_id: batch.lambda_id,
                    batch_id: batch.batch_id,
                    output_size: output.len(),
                    duration: start.elapsed(),
                }
                .log();
                Ok(batch.with_output(output))
            }
            Err(e) => {
                BatchFailed {
                    lambda_id: batch.lambda_id,
                    batch_id: batch.batch_id,
                    error: &e,
                }
                .log();
                Err(e.into())
            }
        }
    }

    /// Observes log entries emitted from now on. After [`close`](Self::close)
    /// the subscription yields what was already delivered and then ends.
    pub fn subscribe(&self) -> LogSubscription {
        self.log_hub.subscribe()
    }

    pub fn state(&self) -> ContextState {
        match &*self.lock() {
            Lifecycle::Ready(_) => ContextState::Ready,
            Lifecycle::Closed => ContextState::Closed,
        }
    }

    /// Drops the program stored under `lambda_id`, if any.
    pub(crate) fn unregister(&self, lambda_id: i32) -> bool {
        match &mut *self.lock() {
            Lifecycle::Ready(runtime) => runtime.unregister(lambda_id),
            Lifecycle::Closed => false,
        }
    }

    pub fn lambda_count(&self) -> usize {
        match &*self.lock() {
            Lifecycle::Ready(runtime) => runtime.lambda_count(),
            Lifecycle::Closed => 0,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Releases the runtime and ends every log subscription. Idempotent.
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.lock(), Lifecycle::Closed);
        if let Lifecycle::Ready(runtime) = previous {
            ContextClosed {
                backend: self.backend,
                lambda_count: runtime.lambda_count(),
            }
            .log();
            drop(runtime);
            self.log_hub.close();
        }
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{EchoRuntime, PanickingRuntime};
    use crate::errors::codes;
    use crate::model::ErrorClass;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn echo_context() -> ComputeContext {
        ComputeContext::new(Box::new(EchoRuntime::default()))
    }

    #[test]
    fn test_new_context_is_ready() {
        let context = echo_context();
        assert_eq!(context.state(), ContextState::Ready);
        assert_eq!(context.backend(), "echo");
        assert_eq!(context.lambda_count(), 0);
    }

    #[test]
    fn test_closed_context_rejects_calls() {
        let context = echo_context();
        context.register(&ComputeLambda::new(1, "p")).unwrap();
        context.close();
        context.close();

        assert_eq!(context.state(), ContextState::Closed);
        let register = context.register(&ComputeLambda::new(2, "p")).unwrap_err();
        let process = context.process(&ComputeBatch::new(1, 1, vec![])).unwrap_err();
        for error in [register, process] {
            assert_eq!(error.code(), codes::CLOSED);
            assert_eq!(error.class(), ErrorClass::Lifecycle);
        }
    }

    #[test]
    fn test_payload_limit() {
        let context = ComputeContext::with_max_payload(Box::new(EchoRuntime::default()), 4);
        context.register(&ComputeLambda::new(1, "p")).unwrap();

        assert!(context.process(&ComputeBatch::new(1, 1, b"four".to_vec())).is_ok());
        let error = context.process(&ComputeBatch::new(1, 2, b"fives".to_vec())).unwrap_err();
        assert_eq!(error.code(), codes::PAYLOAD_TOO_LARGE);
        assert_eq!(error.class(), ErrorClass::Execution);
    }

    #[test]
    fn test_subscription_ends_on_close() {
        let context = echo_context();
        context.register(&ComputeLambda::new(1, "p")).unwrap();
        let mut subscription = context.subscribe();

        context.process(&ComputeBatch::new(1, 1, vec![])).unwrap();
        context.close();

        let entry = subscription.blocking_recv().unwrap();
        assert_eq!(entry.batch_id, 1);
        assert!(subscription.blocking_recv().is_none());
        assert!(context.subscribe().blocking_recv().is_none());
    }

    #[test]
    fn test_lock_recovers_after_runtime_panic() {
        let context = ComputeContext::new(Box::new(PanickingRuntime));
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = context.process(&ComputeBatch::new(1, 1, vec![]));
        }));
        assert!(result.is_err());

        assert_eq!(context.state(), ContextState::Ready);
        assert!(context.register(&ComputeLambda::new(1, "p")).is_ok());
        context.close();
        assert_eq!(context.state(), ContextState::Closed);
    }
}
