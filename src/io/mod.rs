// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire protocol between a compute service and compute clients.
//!
//! Frames are newline-delimited JSON objects carrying the protocol version,
//! a per-connection send counter and a typed [`ComputeMessage`]:
//!
//! ```text
//! {"ver":1,"id":4,"typ":"service_batch","lid":1,"bid":7,"dat":"AQID"}
//! {"ver":1,"id":2,"typ":"client_error","cod":200,"msg":"no lambda registered with id 9"}
//! ```
//!
//! Both ends send an "I'm alive" message at 90% of the connection timeout and
//! consider the connection disrupted when nothing arrives within the timeout.
//! An exit message from either side terminates the connection.

mod channel;
mod client_tcp;
mod connection;
mod message;
mod service_tcp;
mod status;


pub use channel::{ComputeChannel, FrameReader, FrameWriter};
pub use client_tcp::ComputeClientTcp;
pub use message::{ComputeMessage, Frame};
pub use service_tcp::{ComputeServiceTcp, ComputeServiceTcpListener, ServiceEvent, ServiceEvents};
pub use status::{ClientStatus, ServiceStatus};
