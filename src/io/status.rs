// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::{Display, Formatter};

/// State of one connection as seen by its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkStatus {
    Connected,
    /// Ended without an exit message: stale, reset or I/O failure.
    Disrupted,
    /// Ended by an exit message from either side.
    Terminated,
}

/// Status of a service-side connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Connected,
    Disrupted,
    Terminated,
}

/// Status of a client-side connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Connecting,
    Connected,
    Disrupted,
    Terminated,
}

impl From<LinkStatus> for ServiceStatus {
    fn from(status: LinkStatus) -> Self {
        match status {
            LinkStatus::Connected => ServiceStatus::Connected,
            LinkStatus::Disrupted => ServiceStatus::Disrupted,
            LinkStatus::Terminated => ServiceStatus::Terminated,
        }
    }
}

impl From<LinkStatus> for ClientStatus {
    fn from(status: LinkStatus) -> Self {
        match status {
            LinkStatus::Connected => ClientStatus::Connected,
            LinkStatus::Disrupted => ClientStatus::Disrupted,
            LinkStatus::Terminated => ClientStatus::Terminated,
        }
    }
}

impl ServiceStatus {
    pub fn is_final(self) -> bool {
        self != ServiceStatus::Connected
    }
}

impl ClientStatus {
    pub fn is_final(self) -> bool {
        matches!(self, ClientStatus::Disrupted | ClientStatus::Terminated)
    }
}

impl Display for LinkStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            LinkStatus::Connected => "connected",
            LinkStatus::Disrupted => "disrupted",
            LinkStatus::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
