// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod codes;
mod computer;
mod config;
mod context;
mod transport;

pub use computer::ComputerError;
pub use config::{ConfigError, ValidationError};
pub use context::ContextError;
pub use transport::TransportError;
