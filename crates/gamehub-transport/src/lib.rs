//! Transport layer for GameHub.
//!
//! Everything in this crate deals in raw bytes — it knows nothing about
//! commands, rooms, or the catalog. It provides:
//!
//! - [`TcpTransport`] — the listener that accepts connections
//! - [`ConnId`] — opaque per-connection identifier
//! - [`frame`] — length-prefixed message framing and file streaming
//! - [`ClientHandle`] / [`Outbound`] — the per-connection outbound channel
//!   used to push frames (and file streams) to a client from any task

mod conn;
mod error;
pub mod frame;
mod tcp;

pub use conn::{ClientHandle, Outbound, drain_outbound};
pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Assigned from a process-wide counter on accept. Two handles refer to the
/// same connection exactly when their ids compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    /// Creates a `ConnId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
