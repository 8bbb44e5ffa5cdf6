//! Unified error type for the hub.

use gamehub_catalog::CatalogError;
use gamehub_protocol::ProtocolError;
use gamehub_room::RoomError;
use gamehub_session::SessionError;
use gamehub_transport::TransportError;

/// Top-level error wrapping each layer's error type.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors automatically.
/// Only transport-fatal conditions propagate this far — client-visible
/// failures become `status: fail` replies long before.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A transport-level fault (accept, framing, file streaming).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level fault (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A catalog fault.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A session fault.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room or relay fault.
    #[error(transparent)]
    Room(#[from] RoomError),
}
