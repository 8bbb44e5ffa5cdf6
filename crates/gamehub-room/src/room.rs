//! One lobby room.

use std::collections::VecDeque;

use gamehub_protocol::{GameId, RoomId, RoomInfo, RoomStatus};

/// Chat lines kept per room; the oldest line is evicted beyond this.
const CHAT_CAPACITY: usize = 50;

/// A lobby room: players gathered around one catalog game, pre-relay.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub game_id: GameId,
    /// Denormalized from the catalog at creation so listings don't need a
    /// catalog lookup (and survive the game's later removal).
    pub game_name: String,
    pub host: String,
    /// Members in join order, no duplicates. The host is always a member.
    pub players: Vec<String>,
    pub status: RoomStatus,
    chat: VecDeque<String>,
}

impl Room {
    pub(crate) fn new(id: RoomId, game_id: GameId, game_name: &str, host: &str) -> Self {
        Self {
            id,
            game_id,
            game_name: game_name.to_string(),
            host: host.to_string(),
            players: vec![host.to_string()],
            status: RoomStatus::Waiting,
            chat: VecDeque::new(),
        }
    }

    /// Returns `true` if the user is a member.
    pub fn contains(&self, user: &str) -> bool {
        self.players.iter().any(|p| p == user)
    }

    /// Appends a chat line, evicting the oldest beyond the cap.
    pub fn append_chat(&mut self, user: &str, msg: &str) {
        self.chat.push_back(format!("{user}: {msg}"));
        if self.chat.len() > CHAT_CAPACITY {
            self.chat.pop_front();
        }
    }

    /// A wire-ready snapshot of this room.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            game_id: self.game_id,
            game_name: self.game_name.clone(),
            host: self.host.clone(),
            players: self.players.clone(),
            status: self.status,
            chat_history: self.chat.iter().cloned().collect(),
        }
    }
}
