//! Error types for the room layer.
//!
//! `Display` strings double as the client-facing `msg` of a failure reply.

use gamehub_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("Room not found")]
    NotFound(RoomId),

    /// The room exists but is not accepting joins (already playing).
    #[error("Room is full or closed")]
    NotJoinable(RoomId),

    /// Someone other than the host tried a host-only operation.
    #[error("Only the host can start the game")]
    NotHost,
}
