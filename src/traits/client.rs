// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::io::ClientStatus;
use crate::model::{ComputeBatch, ComputeError, ComputeLambda, ComputeLogEntry};

/// Something the compute service sent, or a change in the connection.
#[derive(Debug)]
pub enum ClientEvent {
    Lambda(ComputeLambda),
    Batch(ComputeBatch),
    Status(ClientStatus),
    Exception(TransportError),
}

/// Client side of a compute service connection, as used by a
/// [`Computer`](crate::computer::Computer).
///
/// Submissions are queued without waiting for the peer. Events are delivered
/// in arrival order and end after the final status.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    fn submit_batch(&self, batch: ComputeBatch) -> Result<(), TransportError>;

    fn submit_error(&self, error: ComputeError) -> Result<(), TransportError>;

    fn submit_log_entry(&self, entry: ComputeLogEntry) -> Result<(), TransportError>;

    /// Next event, `None` once the connection has ended and all events were seen.
    async fn next_event(&self) -> Option<ClientEvent>;

    fn status(&self) -> ClientStatus;

    fn close(&self);
}
