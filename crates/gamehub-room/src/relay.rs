//! Game relay: ephemeral broadcast groups for running sessions.
//!
//! When an external game process joins a room's session it lands here, not
//! in the lobby room — the relay group is the set of *sockets* exchanging
//! turn data, and its membership is independent of lobby membership.
//!
//! The relay has no game-rule knowledge. Moves are opaque payloads, and any
//! participant may unilaterally end the session by asserting the terminal
//! marker in a move's `symbol` field — the external game programs own the
//! actual rules.
//!
//! Every push goes through a peer's outbound channel and is best-effort: a
//! departed socket's channel is closed, the send is dropped, and the caller
//! never sees an error.

use std::collections::HashMap;

use gamehub_protocol::{Codec, JsonCodec, RoomId, ServerEvent};
use gamehub_transport::{ClientHandle, ConnId};

/// The client-asserted terminal marker: a move carrying this symbol ends
/// the session (relay group and room are deleted).
pub const TERMINAL_MARKER: &str = "WIN";

/// One socket participating in a room's session.
#[derive(Debug, Clone)]
pub struct RelayPeer {
    pub conn: ClientHandle,
    pub username: String,
}

/// All active relay groups, keyed by room id.
#[derive(Debug, Default)]
pub struct GameRelay {
    groups: HashMap<RoomId, Vec<RelayPeer>>,
    codec: JsonCodec,
}

impl GameRelay {
    /// Creates an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, peer: &ClientHandle, event: &ServerEvent) {
        match self.codec.encode(event) {
            Ok(bytes) => peer.push_frame(bytes),
            Err(e) => tracing::error!(error = %e, "event encode failed"),
        }
    }

    /// Adds a socket to a room's group.
    ///
    /// A peer with the same username is replaced, not duplicated — a game
    /// process reconnecting must supersede its stale entry. When the group
    /// reaches exactly two peers both get `game_start`: the first joiner is
    /// `X` and moves first. A third or later joiner only gets a degraded
    /// `game_start` (`turn: false`, generic opponent); true alternation is
    /// two-party only, this merely keeps the extra socket from hanging.
    pub fn join(&mut self, room_id: RoomId, username: &str, conn: ClientHandle) {
        let group = {
            let group = self.groups.entry(room_id).or_default();
            group.retain(|p| p.username != username);
            group.push(RelayPeer {
                conn,
                username: username.to_string(),
            });
            group.clone()
        };
        tracing::info!(%room_id, %username, peers = group.len(), "relay join");

        match group.len() {
            2 => {
                let first = &group[0];
                let second = &group[1];
                self.push(
                    &first.conn,
                    &ServerEvent::GameStart {
                        symbol: "X".into(),
                        opponent: second.username.clone(),
                        turn: true,
                    },
                );
                self.push(
                    &second.conn,
                    &ServerEvent::GameStart {
                        symbol: "O".into(),
                        opponent: first.username.clone(),
                        turn: false,
                    },
                );
            }
            n if n > 2 => {
                let newcomer = &group[n - 1];
                self.push(
                    &newcomer.conn,
                    &ServerEvent::GameStart {
                        symbol: format!("P{n}"),
                        opponent: "Others".into(),
                        turn: false,
                    },
                );
            }
            _ => {}
        }
    }

    /// Relays a move to every peer in the group except the sender.
    ///
    /// Returns `true` when the move carried the terminal marker — the group
    /// is deleted here and the caller must delete the owning room.
    pub fn broadcast_move(
        &mut self,
        room_id: RoomId,
        sender: ConnId,
        index: &serde_json::Value,
        symbol: &str,
    ) -> bool {
        let Some(group) = self.groups.get(&room_id) else {
            return false;
        };

        for peer in group.iter().filter(|p| p.conn.id() != sender) {
            self.push(
                &peer.conn,
                &ServerEvent::OpponentMove {
                    index: index.clone(),
                    symbol: symbol.to_string(),
                },
            );
        }

        if symbol == TERMINAL_MARKER {
            self.groups.remove(&room_id);
            tracing::info!(%room_id, "session finished, relay group removed");
            return true;
        }
        false
    }

    /// Restarts a finished two-party session with reversed turn order.
    ///
    /// Returns `true` if the restart happened (caller flips the room back
    /// to playing). With fewer than two peers left, the requester gets an
    /// `opponent_left` instead. A missing group is a no-op.
    pub fn restart(&mut self, room_id: RoomId, requester: &ClientHandle) -> bool {
        let Some(group) = self.groups.get_mut(&room_id) else {
            return false;
        };

        if group.len() == 2 {
            group.reverse();
            let first = group[0].clone();
            let second = group[1].clone();
            self.push(
                &first.conn,
                &ServerEvent::GameStart {
                    symbol: "X".into(),
                    opponent: second.username.clone(),
                    turn: true,
                },
            );
            self.push(
                &second.conn,
                &ServerEvent::GameStart {
                    symbol: "O".into(),
                    opponent: first.username.clone(),
                    turn: false,
                },
            );
            tracing::info!(%room_id, "session restarted with reversed turn order");
            true
        } else {
            self.push(requester, &ServerEvent::OpponentLeft);
            false
        }
    }

    /// Disconnect cleanup: strips a connection from every group it is in.
    ///
    /// Peers are matched by connection id, and additionally by `username`
    /// when one is known — a lobby client disconnecting takes its game
    /// process's entries down with it. Remaining peers of each affected
    /// group get `opponent_left`; emptied groups are deleted. Returns the
    /// affected room ids.
    pub fn remove_conn(&mut self, conn: ConnId, username: Option<&str>) -> Vec<RoomId> {
        let mut affected = Vec::new();

        self.groups.retain(|room_id, group| {
            let before = group.len();
            group.retain(|p| p.conn.id() != conn && Some(p.username.as_str()) != username);
            if group.len() != before {
                affected.push(*room_id);
                for peer in group.iter() {
                    match self.codec.encode(&ServerEvent::OpponentLeft) {
                        Ok(bytes) => peer.conn.push_frame(bytes),
                        Err(e) => tracing::error!(error = %e, "event encode failed"),
                    }
                }
            }
            !group.is_empty()
        });

        for room_id in &affected {
            tracing::info!(%room_id, %conn, "relay peer disconnected");
        }
        affected
    }

    /// Number of peers in a room's group (0 if no group).
    pub fn group_len(&self, room_id: RoomId) -> usize {
        self.groups.get(&room_id).map_or(0, Vec::len)
    }

    /// Returns `true` if a group exists for the room.
    pub fn contains(&self, room_id: RoomId) -> bool {
        self.groups.contains_key(&room_id)
    }
}

// =========================================================================
// Tests
// =========================================================================
