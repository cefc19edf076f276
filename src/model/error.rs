// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::codes;

/// Broad category of a [`ComputeError`], derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Operation attempted on a context that is not ready.
    Lifecycle,
    /// A program could not be registered.
    Registration,
    /// A batch could not be processed.
    Execution,
    /// Code outside every known range, typically reported by a remote peer.
    Unknown,
}

/// Signifies a failure to perform some compute action.
///
/// The code is never `0`, which is reserved for success.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
#[serde(try_from = "RawComputeError")]
pub struct ComputeError {
    #[serde(rename = "cod")]
    code: i32,
    #[serde(rename = "msg")]
    message: String,
}

impl ComputeError {
    /// Creates a new error. A zero code is replaced by [`codes::UNSPECIFIED`].
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let code = if code == codes::SUCCESS {
            codes::UNSPECIFIED
        } else {
            code
        };
        Self {
            code,
            message: message.into(),
        }
    }

    /// Interprets a `(code, message)` result pair, where code `0` means success.
    pub fn from_result(code: i32, message: impl Into<String>) -> Option<Self> {
        (code != codes::SUCCESS).then(|| Self {
            code,
            message: message.into(),
        })
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn class(&self) -> ErrorClass {
        codes::class_of(self.code)
    }
}

#[derive(Deserialize)]
struct RawComputeError {
    cod: i32,
    msg: String,
}

impl TryFrom<RawComputeError> for ComputeError {
    type Error = String;

    fn try_from(raw: RawComputeError) -> Result<Self, Self::Error> {
        ComputeError::from_result(raw.cod, raw.msg)
            .ok_or_else(|| "error code 0 is reserved for success".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_code_is_never_reported() {
        assert!(ComputeError::from_result(0, "fine").is_none());
        assert_eq!(ComputeError::new(0, "oops").code(), codes::UNSPECIFIED);
    }

    #[test]
    fn test_decoding_zero_code_fails() {
        let result = serde_json::from_str::<ComputeError>(r#"{"cod":0,"msg":"ok"}"#);
        assert!(result.is_err());

        let error: ComputeError = serde_json::from_str(r#"{"cod":12345,"msg":"bad"}"#).unwrap();
        assert_eq!(error.code(), 12345);
        assert_eq!(error.message(), "bad");
        assert_eq!(error.class(), ErrorClass::Unknown);
    }

    #[test]
    fn test_class_follows_code_range() {
        assert_eq!(ComputeError::new(codes::CLOSED, "x").class(), ErrorClass::Lifecycle);
        assert_eq!(ComputeError::new(codes::COMPILE_FAILED, "x").class(), ErrorClass::Registration);
        assert_eq!(ComputeError::new(codes::UNKNOWN_LAMBDA, "x").class(), ErrorClass::Execution);
    }
}
