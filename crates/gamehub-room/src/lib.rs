//! Room and relay layer for GameHub.
//!
//! Two distinct registries live here:
//!
//! - [`RoomManager`] — lobby-level rooms: named groupings of players bound
//!   to one catalog game, with host/member lists, a status lifecycle, and a
//!   bounded chat log. Pre-game state.
//! - [`GameRelay`] — ephemeral broadcast groups of the sockets that external
//!   game processes opened for one room id, exchanging opaque turn data.
//!
//! A room can exist without a relay group (players sitting in the lobby)
//! and a relay group without a room (game processes that outlived it); the
//! connection handler ties their lifecycles together where the protocol
//! demands it.

mod error;
mod manager;
mod relay;
mod room;

pub use error::RoomError;
pub use manager::RoomManager;
pub use relay::{GameRelay, RelayPeer, TERMINAL_MARKER};
pub use room::Room;
