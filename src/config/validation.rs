// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation of loaded configurations.
//!
//! Every check runs; all problems are reported together.

use std::collections::HashSet;

use crate::config::Config;
use crate::errors::ValidationError;

/// Validate a configuration, returning every problem found.
pub fn validate_config(cfg: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if cfg.service.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroTimeout { field: "service.timeout_ms" });
    }
    if cfg.client.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroTimeout { field: "client.timeout_ms" });
    }
    if cfg.client.connect_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroTimeout { field: "client.connect_timeout_ms" });
    }
    if cfg.computer.threads == Some(0) {
        errors.push(ValidationError::ZeroThreads);
    }

    let fuel = &cfg.context.wasm.fuel;
    if fuel.get_minimum() > fuel.get_maximum() {
        errors.push(ValidationError::InvertedFuelRange {
            minimum: fuel.get_minimum(),
            maximum: fuel.get_maximum(),
        });
    }

    let limits = [
        ("context.lua.instruction_limit", cfg.context.lua.instruction_limit.map(|v| v as usize)),
        ("context.lua.memory_limit_bytes", cfg.context.lua.memory_limit_bytes),
        ("context.max_payload_bytes", cfg.context.max_payload_bytes),
        ("service.max_frame_bytes", cfg.service.max_frame_bytes),
        ("client.max_frame_bytes", cfg.client.max_frame_bytes),
    ];
    for (field, value) in limits {
        if value == Some(0) {
            errors.push(ValidationError::ZeroLimit { field });
        }
    }

    let seeded: HashSet<i32> = cfg.service.lambdas.iter().map(|l| l.id).collect();
    for batch in &cfg.service.batches {
        if !seeded.contains(&batch.lambda_id) {
            errors.push(ValidationError::UnseededLambda {
                lambda_id: batch.lambda_id,
                batch_id: batch.batch_id,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
