// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stable numeric codes reported with every [`ComputeError`](crate::model::ComputeError).
//!
//! Codes are grouped in ranges, one per [`ErrorClass`]:
//! * `1..100` - lifecycle
//! * `100..200` - registration
//! * `200..300` - execution

use crate::model::ErrorClass;

/// Reserved for success; never carried by an error.
pub const SUCCESS: i32 = 0;

pub const UNSPECIFIED: i32 = 1;
pub const CLOSED: i32 = 2;
pub const CONSTRUCTION_FAILED: i32 = 3;

pub const COMPILE_FAILED: i32 = 100;
pub const LOAD_FAILED: i32 = 101;
pub const NOT_REGISTERED: i32 = 102;

pub const UNKNOWN_LAMBDA: i32 = 200;
pub const RUNTIME_FAULT: i32 = 201;
pub const NO_OUTPUT: i32 = 202;
pub const INVALID_OUTPUT: i32 = 203;
pub const BUDGET_EXHAUSTED: i32 = 204;
pub const PAYLOAD_TOO_LARGE: i32 = 205;

pub fn class_of(code: i32) -> ErrorClass {
    match code {
        1..=99 => ErrorClass::Lifecycle,
        100..=199 => ErrorClass::Registration,
        200..=299 => ErrorClass::Execution,
        _ => ErrorClass::Unknown,
    }
}
