// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::codes;
use crate::model::{ComputeError, ErrorClass};

/// Failures reported by compute contexts and their lambda runtimes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("compute context is closed")]
    Closed,

    #[error("failed to construct compute context: {0}")]
    Construction(String),

    #[error("lambda {lambda_id} failed to compile: {message}")]
    Compile { lambda_id: i32, message: String },

    #[error("lambda {lambda_id} faulted while being registered: {message}")]
    Load { lambda_id: i32, message: String },

    #[error("lambda {lambda_id} program did not register a lambda function: {reason}")]
    NotRegistered { lambda_id: i32, reason: String },

    #[error("no lambda registered with id {lambda_id}")]
    UnknownLambda { lambda_id: i32 },

    #[error("lambda {lambda_id} faulted processing batch {batch_id}: {message}")]
    Runtime {
        lambda_id: i32,
        batch_id: i32,
        message: String,
    },

    #[error("lambda {lambda_id} produced no output for batch {batch_id}")]
    NoOutput { lambda_id: i32, batch_id: i32 },

    #[error("lambda {lambda_id} returned {type_name} instead of bytes for batch {batch_id}")]
    InvalidOutput {
        lambda_id: i32,
        batch_id: i32,
        type_name: String,
    },

    #[error("lambda {lambda_id} exhausted its execution budget on batch {batch_id}")]
    BudgetExhausted { lambda_id: i32, batch_id: i32 },

    #[error("batch {batch_id} payload is {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { batch_id: i32, size: usize, max: usize },
}

impl ContextError {
    pub fn code(&self) -> i32 {
        match self {
            ContextError::Closed => codes::CLOSED,
            ContextError::Construction(_) => codes::CONSTRUCTION_FAILED,
            ContextError::Compile { .. } => codes::COMPILE_FAILED,
            ContextError::Load { .. } => codes::LOAD_FAILED,
            ContextError::NotRegistered { .. } => codes::NOT_REGISTERED,
            ContextError::UnknownLambda { .. } => codes::UNKNOWN_LAMBDA,
            ContextError::Runtime { .. } => codes::RUNTIME_FAULT,
            ContextError::NoOutput { .. } => codes::NO_OUTPUT,
            ContextError::InvalidOutput { .. } => codes::INVALID_OUTPUT,
            ContextError::BudgetExhausted { .. } => codes::BUDGET_EXHAUSTED,
            ContextError::PayloadTooLarge { .. } => codes::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn class(&self) -> ErrorClass {
        codes::class_of(self.code())
    }
}

impl From<ContextError> for ComputeError {
    fn from(error: ContextError) -> Self {
        ComputeError::new(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_classified_nonzero_code() {
        let errors = vec![
            (ContextError::Closed, ErrorClass::Lifecycle),
            (ContextError::Construction("x".into()), ErrorClass::Lifecycle),
            (ContextError::Compile { lambda_id: 1, message: "x".into() }, ErrorClass::Registration),
            (ContextError::Load { lambda_id: 1, message: "x".into() }, ErrorClass::Registration),
            (ContextError::NotRegistered { lambda_id: 1, reason: "x".into() }, ErrorClass::Registration),
            (ContextError::UnknownLambda { lambda_id: 1 }, ErrorClass::Execution),
            (ContextError::Runtime { lambda_id: 1, batch_id: 2, message: "x".into() }, ErrorClass::Execution),
            (ContextError::NoOutput { lambda_id: 1, batch_id: 2 }, ErrorClass::Execution),
            (ContextError::InvalidOutput { lambda_id: 1, batch_id: 2, type_name: "table".into() }, ErrorClass::Execution),
            (ContextError::BudgetExhausted { lambda_id: 1, batch_id: 2 }, ErrorClass::Execution),
            (ContextError::PayloadTooLarge { batch_id: 2, size: 10, max: 5 }, ErrorClass::Execution),
        ];

        for (error, class) in errors {
            assert_ne!(error.code(), codes::SUCCESS, "{error}");
            assert_eq!(error.class(), class, "{error}");

            let compute_error = ComputeError::from(error.clone());
            assert_eq!(compute_error.code(), error.code());
            assert_eq!(compute_error.message(), error.to_string());
        }
    }
}
