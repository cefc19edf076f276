// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Value types shared by compute contexts, the wire protocol and the computer.

mod batch;
mod error;
mod lambda;
mod log_entry;
mod time;

pub use batch::ComputeBatch;
pub use error::{ComputeError, ErrorClass};
pub use lambda::ComputeLambda;
pub use log_entry::ComputeLogEntry;
pub use time::UnixTime;

/// Serde helper encoding byte payloads as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
