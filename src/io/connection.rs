// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Connection driver shared by the service and client endpoints.
//!
//! One task owns the write half and multiplexes outgoing messages, keepalives,
//! cancellation and the stale-connection deadline. A second task owns the read
//! half and forwards decoded frames, so a partially read line is never lost to
//! a `select!` branch being dropped.

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::channel::{FrameReader, FrameWriter};
use super::message::{ComputeMessage, Frame};
use super::status::LinkStatus;
use crate::config::consts::MIN_KEEPALIVE_INTERVAL_MS;
use crate::config::ConnectionOptions;
use crate::errors::TransportError;
use crate::observability::messages::transport::{ConnectionStatusChanged, FrameFailed};
use crate::observability::messages::StructuredLog;

/// Which end of the protocol a connection speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Service,
    Client,
}

enum Inbound {
    KeepAlive,
    Exit,
    Deliver(ComputeMessage),
    Unexpected(&'static str),
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Service => "service",
            Role::Client => "client",
        }
    }

    fn keepalive(self) -> ComputeMessage {
        match self {
            Role::Service => ComputeMessage::ServiceImAlive,
            Role::Client => ComputeMessage::ClientImAlive,
        }
    }

    fn exit(self) -> ComputeMessage {
        match self {
            Role::Service => ComputeMessage::ServiceExit,
            Role::Client => ComputeMessage::ClientExit,
        }
    }

    fn classify(self, message: ComputeMessage) -> Inbound {
        match (self, message) {
            (Role::Service, ComputeMessage::ClientImAlive) => Inbound::KeepAlive,
            (Role::Service, ComputeMessage::ClientExit) => Inbound::Exit,
            (Role::Client, ComputeMessage::ServiceImAlive) => Inbound::KeepAlive,
            (Role::Client, ComputeMessage::ServiceExit) => Inbound::Exit,
            (Role::Service, message) if message.is_from_client() => Inbound::Deliver(message),
            (Role::Client, message) if !message.is_from_client() => Inbound::Deliver(message),
            (_, message) => Inbound::Unexpected(message.kind()),
        }
    }
}

/// What a driver reports to its endpoint.
#[derive(Debug)]
pub(crate) enum LinkEvent {
    Message(ComputeMessage),
    Exception(TransportError),
    Status(LinkStatus),
}

/// Endpoint-side handle of a running connection.
pub(crate) struct Link {
    pub peer: String,
    outgoing: mpsc::UnboundedSender<ComputeMessage>,
    status: watch::Receiver<LinkStatus>,
    cancel: CancellationToken,
}

impl Link {
    /// Starts driving `stream`. Events arrive on the returned receiver, which
    /// ends after the final status.
    pub fn spawn<S>(
        stream: S,
        role: Role,
        peer: String,
        options: ConnectionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Connected);
        let cancel = CancellationToken::new();

        let reader = FrameReader::new(BufReader::new(read_half), options.max_frame_bytes);
        tokio::spawn(read_frames(reader, frames_tx, cancel.child_token()));

        let driver = Driver {
            role,
            peer: peer.clone(),
            options,
            writer: FrameWriter::new(write_half),
            outgoing: outgoing_rx,
            frames: frames_rx,
            events: events_tx,
            status: status_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run());

        let link = Self {
            peer,
            outgoing: outgoing_tx,
            status: status_rx,
            cancel,
        };
        (link, events_rx)
    }

    pub fn send(&self, message: ComputeMessage) -> Result<(), TransportError> {
        if self.status() != LinkStatus::Connected {
            return Err(TransportError::Closed);
        }
        self.outgoing.send(message).map_err(|_| TransportError::Closed)
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Sends the exit message and ends the connection.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the connection has ended.
    pub async fn closed(&self) {
        let mut status = self.status.clone();
        let _ = status.wait_for(|s| *s != LinkStatus::Connected).await;
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_frames<R>(
    mut reader: FrameReader<R>,
    frames: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    cancel: CancellationToken,
) where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = reader.next_frame() => next,
        };
        let fatal = matches!(next, Some(Err(TransportError::Io(_))));
        match next {
            Some(result) => {
                if frames.send(result).is_err() || fatal {
                    return;
                }
            }
            None => return,
        }
    }
}

struct Driver<W> {
    role: Role,
    peer: String,
    options: ConnectionOptions,
    writer: FrameWriter<W>,
    outgoing: mpsc::UnboundedReceiver<ComputeMessage>,
    frames: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
    events: mpsc::UnboundedSender<LinkEvent>,
    status: watch::Sender<LinkStatus>,
    cancel: CancellationToken,
}

impl<W: AsyncWrite + Unpin> Driver<W> {
    async fn run(mut self) {
        self.announce(LinkStatus::Connected);

        let interval = self
            .options
            .keepalive_interval
            .max(Duration::from_millis(MIN_KEEPALIVE_INTERVAL_MS));
        let mut keepalive = time::interval_at(Instant::now() + interval, interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = time::sleep(self.options.timeout);
        tokio::pin!(deadline);

        let end = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let exit = self.role.exit();
                    if let Err(e) = self.writer.send(exit).await {
                        self.report_failure(&e);
                    }
                    break LinkStatus::Terminated;
                }
                Some(message) = self.outgoing.recv() => {
                    if let Err(e) = self.writer.send(message).await {
                        self.report_failure(&e);
                        break LinkStatus::Disrupted;
                    }
                }
                _ = keepalive.tick() => {
                    if let Err(e) = self.writer.send(self.role.keepalive()).await {
                        self.report_failure(&e);
                        break LinkStatus::Disrupted;
                    }
                }
                inbound = self.frames.recv() => {
                    let frame = match inbound {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => {
                            self.report_failure(&e);
                            let _ = self.events.send(LinkEvent::Exception(e));
                            continue;
                        }
                        None => {
                            let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed the connection");
                            self.report_failure(&TransportError::Io(eof));
                            break LinkStatus::Disrupted;
                        }
                    };
                    deadline.as_mut().reset(Instant::now() + self.options.timeout);
                    match self.role.classify(frame.message) {
                        Inbound::KeepAlive => {}
                        Inbound::Exit => break LinkStatus::Terminated,
                        Inbound::Deliver(message) => {
                            let _ = self.events.send(LinkEvent::Message(message));
                        }
                        Inbound::Unexpected(kind) => {
                            let error = TransportError::UnexpectedMessage(kind.to_string());
                            self.report_failure(&error);
                            let _ = self.events.send(LinkEvent::Exception(error));
                        }
                    }
                }
                _ = &mut deadline => {
                    self.report_failure(&TransportError::Stale(self.options.timeout));
                    break LinkStatus::Disrupted;
                }
            }
        };

        self.cancel.cancel();
        let _ = self.writer.shutdown().await;
        self.announce(end);
    }

    fn announce(&self, status: LinkStatus) {
        let name = status.to_string();
        ConnectionStatusChanged {
            role: self.role.name(),
            peer: &self.peer,
            status: &name,
        }
        .log();
        self.status.send_replace(status);
        let _ = self.events.send(LinkEvent::Status(status));
    }

    fn report_failure(&self, error: &TransportError) {
        FrameFailed {
            role: self.role.name(),
            peer: &self.peer,
            error,
        }
        .log();
    }
}
