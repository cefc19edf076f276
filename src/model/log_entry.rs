// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use super::UnixTime;

/// A message logged by a lambda while it processed a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeLogEntry {
    #[serde(rename = "tim")]
    pub timestamp: UnixTime,
    #[serde(rename = "lid")]
    pub lambda_id: i32,
    #[serde(rename = "bid")]
    pub batch_id: i32,
    #[serde(rename = "msg")]
    pub message: String,
}

impl ComputeLogEntry {
    /// Creates new log entry with the current time as timestamp.
    pub fn new(lambda_id: i32, batch_id: i32, message: impl Into<String>) -> Self {
        Self::with_timestamp(UnixTime::now(), lambda_id, batch_id, message)
    }

    pub fn with_timestamp(
        timestamp: UnixTime,
        lambda_id: i32,
        batch_id: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            lambda_id,
            batch_id,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_every_field() {
        // Each field must come from its own key.
        let json = r#"{"tim":1500,"lid":11,"bid":22,"msg":"Surprise!"}"#;
        let entry: ComputeLogEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.timestamp, UnixTime::from_millis(1500));
        assert_eq!(entry.lambda_id, 11);
        assert_eq!(entry.batch_id, 22);
        assert_eq!(entry.message, "Surprise!");
    }
}
