// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::connection::{Link, LinkEvent, Role};
use super::message::ComputeMessage;
use super::status::ServiceStatus;
use crate::config::ConnectionOptions;
use crate::errors::TransportError;
use crate::model::{ComputeBatch, ComputeError, ComputeLambda, ComputeLogEntry};
use crate::observability::messages::transport::ListenerStarted;
use crate::observability::messages::StructuredLog;

/// Something a compute client sent, or a change in the connection.
#[derive(Debug)]
pub enum ServiceEvent {
    Batch(ComputeBatch),
    Error(ComputeError),
    LogEntry(ComputeLogEntry),
    Status(ServiceStatus),
    Exception(TransportError),
}

/// Service side of one client connection.
pub struct ComputeServiceTcp {
    link: Link,
}

impl ComputeServiceTcp {
    pub fn peer(&self) -> &str {
        &self.link.peer
    }

    pub fn submit_lambda(&self, lambda: ComputeLambda) -> Result<(), TransportError> {
        self.link.send(ComputeMessage::ServiceLambda(lambda))
    }

    pub fn submit_batch(&self, batch: ComputeBatch) -> Result<(), TransportError> {
        self.link.send(ComputeMessage::ServiceBatch(batch))
    }

    pub fn status(&self) -> ServiceStatus {
        self.link.status().into()
    }

    /// Sends `service_exit` and ends the connection.
    pub fn close(&self) {
        self.link.close();
    }

    pub async fn closed(&self) {
        self.link.closed().await;
    }
}

/// Events of one [`ComputeServiceTcp`]. Ends after the final status.
pub struct ServiceEvents {
    inner: mpsc::UnboundedReceiver<LinkEvent>,
}

impl ServiceEvents {
    pub async fn recv(&mut self) -> Option<ServiceEvent> {
        loop {
            let event = match self.inner.recv().await? {
                LinkEvent::Message(ComputeMessage::ClientBatch(batch)) => ServiceEvent::Batch(batch),
                LinkEvent::Message(ComputeMessage::ClientError(error)) => ServiceEvent::Error(error),
                LinkEvent::Message(ComputeMessage::ClientLogEntry(entry)) => {
                    ServiceEvent::LogEntry(entry)
                }
                LinkEvent::Message(_) => continue,
                LinkEvent::Exception(e) => ServiceEvent::Exception(e),
                LinkEvent::Status(status) => ServiceEvent::Status(status.into()),
            };
            return Some(event);
        }
    }
}

/// Accepts compute clients over TCP.
pub struct ComputeServiceTcpListener {
    listener: TcpListener,
    options: ConnectionOptions,
}

impl ComputeServiceTcpListener {
    pub async fn bind(address: &str, options: ConnectionOptions) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address).await?;
        let local = listener.local_addr()?.to_string();
        ListenerStarted { address: &local }.log();
        Ok(Self { listener, options })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Waits for the next client.
    pub async fn accept(&self) -> Result<(ComputeServiceTcp, ServiceEvents), TransportError> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        let (link, events) = Link::spawn(stream, Role::Service, peer.to_string(), self.options);
        Ok((ComputeServiceTcp { link }, ServiceEvents { inner: events }))
    }
}
