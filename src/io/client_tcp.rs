// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use super::connection::{Link, LinkEvent, Role};
use super::message::ComputeMessage;
use super::status::ClientStatus;
use crate::config::ConnectionOptions;
use crate::errors::TransportError;
use crate::model::{ComputeBatch, ComputeError, ComputeLogEntry};
use crate::observability::messages::transport::ConnectionStatusChanged;
use crate::observability::messages::StructuredLog;
use crate::traits::{ClientEvent, ComputeClient};

/// Client side of a connection to a compute service.
pub struct ComputeClientTcp {
    link: Link,
    events: Mutex<ClientEvents>,
}

struct ClientEvents {
    receiver: mpsc::UnboundedReceiver<LinkEvent>,
    /// The event stream opens with `Connecting`, delivered once.
    connecting_pending: bool,
}

impl ComputeClientTcp {
    /// Connects to `address`, giving up after `connect_timeout`.
    pub async fn connect(
        address: &str,
        options: ConnectionOptions,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        ConnectionStatusChanged {
            role: Role::Client.name(),
            peer: address,
            status: "connecting",
        }
        .log();

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                address: address.to_string(),
                timeout: connect_timeout,
            })??;
        stream.set_nodelay(true)?;

        let (link, events) = Link::spawn(stream, Role::Client, address.to_string(), options);
        Ok(Self {
            link,
            events: Mutex::new(ClientEvents {
                receiver: events,
                connecting_pending: true,
            }),
        })
    }

    pub fn peer(&self) -> &str {
        &self.link.peer
    }

    pub async fn closed(&self) {
        self.link.closed().await;
    }
}

#[async_trait]
impl ComputeClient for ComputeClientTcp {
    fn submit_batch(&self, batch: ComputeBatch) -> Result<(), TransportError> {
        self.link.send(ComputeMessage::ClientBatch(batch))
    }

    fn submit_error(&self, error: ComputeError) -> Result<(), TransportError> {
        self.link.send(ComputeMessage::ClientError(error))
    }

    fn submit_log_entry(&self, entry: ComputeLogEntry) -> Result<(), TransportError> {
        self.link.send(ComputeMessage::ClientLogEntry(entry))
    }

    async fn next_event(&self) -> Option<ClientEvent> {
        let mut events = self.events.lock().await;
        if events.connecting_pending {
            events.connecting_pending = false;
            return Some(ClientEvent::Status(ClientStatus::Connecting));
        }
        loop {
            let event = match events.receiver.recv().await? {
                LinkEvent::Message(ComputeMessage::ServiceLambda(lambda)) => ClientEvent::Lambda(lambda),
                LinkEvent::Message(ComputeMessage::ServiceBatch(batch)) => ClientEvent::Batch(batch),
                LinkEvent::Message(_) => continue,
                LinkEvent::Exception(e) => ClientEvent::Exception(e),
                LinkEvent::Status(status) => ClientEvent::Status(status.into()),
            };
            return Some(event);
        }
    }

    fn status(&self) -> ClientStatus {
        self.link.status().into()
    }

    /// Sends `client_exit` and ends the connection.
    fn close(&self) {
        self.link.close();
    }
}
