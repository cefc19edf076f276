// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A lambda: a program able to process arbitrary byte array batches.
///
/// `lambda_id` is unique within a compute context. Registering a second lambda
/// with the same id replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeLambda {
    #[serde(rename = "lid")]
    pub lambda_id: i32,
    #[serde(rename = "prg")]
    pub program: String,
}

impl ComputeLambda {
    pub fn new(lambda_id: i32, program: impl Into<String>) -> Self {
        Self {
            lambda_id,
            program: program.into(),
        }
    }
}
