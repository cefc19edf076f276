// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::model::{ComputeBatch, ComputeError, ComputeLambda, ComputeLogEntry};

/// Messages exchanged between a compute service and its clients.
///
/// `Client*` messages travel from a client to the service, `Service*`
/// messages the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum ComputeMessage {
    ClientBatch(ComputeBatch),
    ClientError(ComputeError),
    ClientExit,
    ClientImAlive,
    ClientLogEntry(ComputeLogEntry),
    ServiceBatch(ComputeBatch),
    ServiceExit,
    ServiceImAlive,
    ServiceLambda(ComputeLambda),
}

impl ComputeMessage {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ComputeMessage::ClientBatch(_) => "client_batch",
            ComputeMessage::ClientError(_) => "client_error",
            ComputeMessage::ClientExit => "client_exit",
            ComputeMessage::ClientImAlive => "client_im_alive",
            ComputeMessage::ClientLogEntry(_) => "client_log_entry",
            ComputeMessage::ServiceBatch(_) => "service_batch",
            ComputeMessage::ServiceExit => "service_exit",
            ComputeMessage::ServiceImAlive => "service_im_alive",
            ComputeMessage::ServiceLambda(_) => "service_lambda",
        }
    }

    pub fn is_from_client(&self) -> bool {
        matches!(
            self,
            ComputeMessage::ClientBatch(_)
                | ComputeMessage::ClientError(_)
                | ComputeMessage::ClientExit
                | ComputeMessage::ClientImAlive
                | ComputeMessage::ClientLogEntry(_)
        )
    }
}

/// One line on the wire: protocol version, per-connection send counter and
/// the message itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub ver: u32,
    pub id: u64,
    #[serde(flatten)]
    pub message: ComputeMessage,
}

/// Just enough of a frame to check its version before decoding the rest.
#[derive(Deserialize)]
pub(crate) struct FrameHeader {
    pub ver: u32,
}
