// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::model::ComputeError;

#[derive(Error, Debug)]
pub enum ComputerError {
    #[error("computer needs at least one compute context")]
    NoContexts,

    #[error("failed to create compute context: {0}")]
    Context(#[from] ComputeError),

    #[error("connection to compute service was disrupted")]
    Disrupted,
}
