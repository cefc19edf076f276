// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Some arbitrary byte array to be processed by an identified lambda.
///
/// Output batches carry the ids of the batch they were produced from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeBatch {
    #[serde(rename = "lid")]
    pub lambda_id: i32,
    #[serde(rename = "bid")]
    pub batch_id: i32,
    #[serde(rename = "dat", with = "super::base64_bytes")]
    pub data: Vec<u8>,
}

impl ComputeBatch {
    pub fn new(lambda_id: i32, batch_id: i32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            lambda_id,
            batch_id,
            data: data.into(),
        }
    }

    /// Creates the batch holding `data` as the result of processing `self`.
    pub fn with_output(&self, data: Vec<u8>) -> Self {
        Self {
            lambda_id: self.lambda_id,
            batch_id: self.batch_id,
            data,
        }
    }
}

impl std::fmt::Debug for ComputeBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeBatch")
            .field("lambda_id", &self.lambda_id)
            .field("batch_id", &self.batch_id)
            .field("data_len", &self.data.len())
            .finish()
    }
}
