// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Failures loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config file extension '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("configuration validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors that can occur when validating a loaded configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A duration that must be positive is zero
    ZeroTimeout {
        /// The configuration key holding the value
        field: &'static str,
    },
    /// A worker count of zero was requested
    ZeroThreads,
    /// The fuel range is empty
    InvertedFuelRange {
        minimum: u64,
        maximum: u64,
    },
    /// A size or instruction limit of zero was configured
    ZeroLimit {
        field: &'static str,
    },
    /// A seed batch refers to a lambda that is not seeded
    UnseededLambda {
        lambda_id: i32,
        batch_id: i32,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroTimeout { field } => {
                write!(f, "'{}' must be greater than zero", field)
            }
            ValidationError::ZeroThreads => {
                write!(f, "'computer.threads' must be greater than zero")
            }
            ValidationError::InvertedFuelRange { minimum, maximum } => {
                write!(
                    f,
                    "WASM fuel minimum ({}) is greater than maximum ({})",
                    minimum, maximum
                )
            }
            ValidationError::ZeroLimit { field } => {
                write!(f, "'{}' must be greater than zero", field)
            }
            ValidationError::UnseededLambda {
                lambda_id,
                batch_id,
            } => {
                write!(
                    f,
                    "Seed batch {} refers to lambda {} which is not seeded",
                    batch_id, lambda_id
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
