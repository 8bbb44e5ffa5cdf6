//! Wire protocol for GameHub.
//!
//! This crate defines the language that clients and the hub speak:
//!
//! - **Types** ([`Request`], [`Reply`], [`ServerEvent`], and the catalog/room
//!   records that travel inside them) — every structure that crosses the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (frames of raw bytes) and the
//! hub's state machines. It knows nothing about connections, rooms, or disk.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    GameId, GameKind, GameListEntry, GameMeta, GameRecord, Reply, Request, Review, Role, RoomId,
    RoomInfo, RoomStatus, ServerEvent, Status,
};
