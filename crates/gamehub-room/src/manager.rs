//! Room manager: creates, tracks, and mutates lobby rooms.

use std::collections::HashMap;

use gamehub_protocol::{GameId, RoomId, RoomInfo, RoomStatus};

use crate::{Room, RoomError};

/// Manages all active lobby rooms.
///
/// Plain data behind the server's single state guard — every method runs
/// under it, so read-modify-write spans (smallest-unused-id allocation,
/// check-then-append joins) are atomic with respect to other connections.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: HashMap<RoomId, Room>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room hosted by `host` and returns its id — the smallest
    /// positive integer not currently in use, so ids of closed rooms are
    /// reused.
    pub fn create(&mut self, game_id: GameId, game_name: &str, host: &str) -> RoomId {
        let id = self.smallest_unused_id();
        self.rooms
            .insert(id, Room::new(id, game_id, game_name, host));
        tracing::info!(room_id = %id, %game_id, %host, "room created");
        id
    }

    fn smallest_unused_id(&self) -> RoomId {
        let mut candidate = 1u32;
        while self.rooms.contains_key(&RoomId(candidate)) {
            candidate += 1;
        }
        RoomId(candidate)
    }

    /// Adds a user to a waiting room (idempotent) and returns the game the
    /// room is bound to.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] | [`RoomError::NotJoinable`].
    pub fn join(&mut self, room_id: RoomId, user: &str) -> Result<GameId, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        if !room.status.is_joinable() {
            return Err(RoomError::NotJoinable(room_id));
        }
        if !room.contains(user) {
            room.players.push(user.to_string());
            tracing::info!(%room_id, %user, members = room.players.len(), "user joined room");
        }
        Ok(room.game_id)
    }

    /// Removes a user from a room.
    ///
    /// One departure policy for every path (explicit leave and disconnect
    /// cleanup both land here): the room is deleted when it empties;
    /// otherwise, if the departing user was host, the next remaining member
    /// in join order inherits the host role.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room doesn't exist. A user who wasn't
    /// a member is not an error — the removal is simply a no-op.
    pub fn remove_member(&mut self, room_id: RoomId, user: &str) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        Self::depart(room, user);
        if room.players.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!(%room_id, "room emptied, removed");
        }
        Ok(())
    }

    fn depart(room: &mut Room, user: &str) {
        let before = room.players.len();
        room.players.retain(|p| p != user);
        if room.players.len() == before {
            return;
        }
        tracing::info!(room_id = %room.id, %user, "user left room");
        if room.host == user {
            if let Some(next) = room.players.first() {
                room.host = next.clone();
                tracing::info!(room_id = %room.id, new_host = %room.host, "host transferred");
            }
        }
    }

    /// Starts the room's game: host-only; flips the status to playing and
    /// returns the bound game id plus a snapshot of the members, so the
    /// caller can record play history for each of them.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] | [`RoomError::NotHost`].
    pub fn start(&mut self, room_id: RoomId, user: &str) -> Result<(GameId, Vec<String>), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        if room.host != user {
            return Err(RoomError::NotHost);
        }
        room.status = RoomStatus::Playing;
        tracing::info!(%room_id, host = %user, "game started");
        Ok((room.game_id, room.players.clone()))
    }

    /// Sets a room's status. Silently ignores unknown rooms — the relay
    /// paths that call this tolerate the room being gone already.
    pub fn set_status(&mut self, room_id: RoomId, status: RoomStatus) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.status = status;
        }
    }

    /// Removes a room outright (terminal relay move). Returns `true` if it
    /// existed.
    pub fn remove(&mut self, room_id: RoomId) -> bool {
        let existed = self.rooms.remove(&room_id).is_some();
        if existed {
            tracing::info!(%room_id, "room removed");
        }
        existed
    }

    /// Appends a chat line to a room's bounded log.
    ///
    /// # Errors
    /// [`RoomError::NotFound`].
    pub fn append_chat(&mut self, room_id: RoomId, user: &str, msg: &str) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        room.append_chat(user, msg);
        Ok(())
    }

    /// Snapshots of all rooms, ordered by id.
    pub fn list(&self) -> Vec<RoomInfo> {
        let mut infos: Vec<RoomInfo> = self.rooms.values().map(Room::info).collect();
        infos.sort_by_key(|r| r.id.0);
        infos
    }

    /// Snapshot of one room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`].
    pub fn info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        self.rooms
            .get(&room_id)
            .map(Room::info)
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Disconnect cleanup: removes the user from every room they are in,
    /// applying the same departure policy as [`remove_member`](Self::remove_member).
    pub fn remove_user_from_all(&mut self, user: &str) {
        let containing: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|r| r.contains(user))
            .map(|r| r.id)
            .collect();
        for room_id in containing {
            let _ = self.remove_member(room_id, user);
        }
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if the room exists.
    pub fn contains(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_room() -> (RoomManager, RoomId) {
        let mut mgr = RoomManager::new();
        let id = mgr.create(GameId(5), "Bingo", "alice");
        (mgr, id)
    }

    // =====================================================================
    // create / id allocation
    // =====================================================================

    #[test]
    fn test_create_allocates_sequential_ids_from_one() {
        let mut mgr = RoomManager::new();
        assert_eq!(mgr.create(GameId(1), "A", "alice"), RoomId(1));
        assert_eq!(mgr.create(GameId(1), "A", "bob"), RoomId(2));
    }

    #[test]
    fn test_create_reuses_smallest_freed_id() {
        let mut mgr = RoomManager::new();
        let r1 = mgr.create(GameId(1), "A", "alice");
        let _r2 = mgr.create(GameId(1), "A", "bob");
        mgr.remove(r1);

        assert_eq!(mgr.create(GameId(1), "A", "carol"), RoomId(1));
    }

    // =====================================================================
    // join
    // =====================================================================

    #[test]
    fn test_join_returns_bound_game_id() {
        let (mut mgr, id) = manager_with_room();
        assert_eq!(mgr.join(id, "bob").unwrap(), GameId(5));
        assert_eq!(mgr.info(id).unwrap().players, vec!["alice", "bob"]);
    }

    #[test]
    fn test_join_is_idempotent() {
        let (mut mgr, id) = manager_with_room();
        mgr.join(id, "bob").unwrap();
        mgr.join(id, "bob").unwrap();
        assert_eq!(mgr.info(id).unwrap().players.len(), 2);
    }

    #[test]
    fn test_join_missing_room_not_found() {
        let mut mgr = RoomManager::new();
        assert!(matches!(
            mgr.join(RoomId(9), "bob"),
            Err(RoomError::NotFound(_))
        ));
    }

    #[test]
    fn test_join_playing_room_rejected() {
        let (mut mgr, id) = manager_with_room();
        mgr.start(id, "alice").unwrap();
        assert!(matches!(
            mgr.join(id, "bob"),
            Err(RoomError::NotJoinable(_))
        ));
    }

    // =====================================================================
    // departure policy
    // =====================================================================

    #[test]
    fn test_last_member_leaving_deletes_room() {
        let (mut mgr, id) = manager_with_room();
        mgr.remove_member(id, "alice").unwrap();
        assert!(!mgr.contains(id));
    }

    #[test]
    fn test_host_leaving_transfers_to_next_member() {
        let (mut mgr, id) = manager_with_room();
        mgr.join(id, "bob").unwrap();
        mgr.join(id, "carol").unwrap();

        mgr.remove_member(id, "alice").unwrap();

        let info = mgr.info(id).unwrap();
        assert_eq!(info.host, "bob");
        assert_eq!(info.players, vec!["bob", "carol"]);
    }

    #[test]
    fn test_non_host_leaving_keeps_host() {
        let (mut mgr, id) = manager_with_room();
        mgr.join(id, "bob").unwrap();

        mgr.remove_member(id, "bob").unwrap();

        let info = mgr.info(id).unwrap();
        assert_eq!(info.host, "alice");
        assert_eq!(info.players, vec!["alice"]);
    }

    #[test]
    fn test_remove_non_member_is_a_no_op() {
        let (mut mgr, id) = manager_with_room();
        mgr.remove_member(id, "stranger").unwrap();
        assert_eq!(mgr.info(id).unwrap().players, vec!["alice"]);
    }

    #[test]
    fn test_disconnect_cleanup_sweeps_every_room() {
        let mut mgr = RoomManager::new();
        let r1 = mgr.create(GameId(1), "A", "alice");
        let r2 = mgr.create(GameId(2), "B", "bob");
        mgr.join(r2, "alice").unwrap();

        mgr.remove_user_from_all("alice");

        // r1 emptied and vanished; r2 lost the member but kept its host.
        assert!(!mgr.contains(r1));
        assert_eq!(mgr.info(r2).unwrap().players, vec!["bob"]);
    }

    // =====================================================================
    // start / status
    // =====================================================================

    #[test]
    fn test_start_by_host_returns_member_snapshot() {
        let (mut mgr, id) = manager_with_room();
        mgr.join(id, "bob").unwrap();

        let (game_id, members) = mgr.start(id, "alice").unwrap();

        assert_eq!(game_id, GameId(5));
        assert_eq!(members, vec!["alice", "bob"]);
        assert_eq!(mgr.info(id).unwrap().status, RoomStatus::Playing);
    }

    #[test]
    fn test_start_by_non_host_rejected() {
        let (mut mgr, id) = manager_with_room();
        mgr.join(id, "bob").unwrap();
        assert!(matches!(mgr.start(id, "bob"), Err(RoomError::NotHost)));
    }

    #[test]
    fn test_set_status_on_missing_room_is_silent() {
        let mut mgr = RoomManager::new();
        mgr.set_status(RoomId(7), RoomStatus::Waiting);
    }

    #[test]
    fn test_game_over_reopens_room_for_joins() {
        let (mut mgr, id) = manager_with_room();
        mgr.start(id, "alice").unwrap();
        mgr.set_status(id, RoomStatus::Waiting);

        mgr.join(id, "bob").unwrap();
    }

    // =====================================================================
    // listings / chat
    // =====================================================================

    #[test]
    fn test_list_is_ordered_by_id() {
        let mut mgr = RoomManager::new();
        for host in ["a", "b", "c"] {
            mgr.create(GameId(1), "A", host);
        }
        let ids: Vec<u32> = mgr.list().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_chat_reaches_room_info() {
        let (mut mgr, id) = manager_with_room();
        mgr.append_chat(id, "alice", "hi all").unwrap();
        assert_eq!(mgr.info(id).unwrap().chat_history, vec!["alice: hi all"]);
    }

    #[test]
    fn test_chat_to_missing_room_not_found() {
        let mut mgr = RoomManager::new();
        assert!(matches!(
            mgr.append_chat(RoomId(3), "alice", "hi"),
            Err(RoomError::NotFound(_))
        ));
    }
}
