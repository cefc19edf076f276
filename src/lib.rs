// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // lambda runtimes
pub mod computer;      // client-side worker
pub mod config;        // config loading + validation
pub mod context;       // compute contexts
pub mod errors;        // error handling
pub mod io;            // wire protocol
pub mod model;         // shared value types
pub mod observability;
pub mod traits;        // unified abstractions
