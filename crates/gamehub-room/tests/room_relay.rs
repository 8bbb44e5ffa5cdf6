//! Integration tests exercising the room manager and game relay together,
//! the way the connection handler drives them.

use gamehub_protocol::{GameId, RoomId, RoomStatus};
use gamehub_room::{GameRelay, RoomManager, TERMINAL_MARKER};
use gamehub_transport::{ClientHandle, ConnId, Outbound};
use tokio::sync::mpsc::UnboundedReceiver;

fn peer(id: u64) -> (ClientHandle, UnboundedReceiver<Outbound>) {
    ClientHandle::new(ConnId::new(id))
}

fn next_event(rx: &mut UnboundedReceiver<Outbound>) -> serde_json::Value {
    match rx.try_recv().expect("expected a queued event") {
        Outbound::Frame(bytes) => serde_json::from_slice(&bytes).unwrap(),
        other => panic!("expected a frame, got {other:?}"),
    }
}

/// Builds the usual shape: a lobby room with two members, and a relay group
/// for it with each member's game-process socket.
fn lobby_and_session() -> (
    RoomManager,
    GameRelay,
    RoomId,
    (ClientHandle, UnboundedReceiver<Outbound>),
    (ClientHandle, UnboundedReceiver<Outbound>),
) {
    let mut rooms = RoomManager::new();
    let room_id = rooms.create(GameId(1), "Tic Tac Toe", "alice");
    rooms.join(room_id, "bob").unwrap();
    rooms.start(room_id, "alice").unwrap();

    let mut relay = GameRelay::new();
    let (alice, mut alice_rx) = peer(11);
    let (bob, mut bob_rx) = peer(12);
    relay.join(room_id, "alice", alice.clone());
    relay.join(room_id, "bob", bob.clone());
    let _ = next_event(&mut alice_rx); // game_start
    let _ = next_event(&mut bob_rx);

    (rooms, relay, room_id, (alice, alice_rx), (bob, bob_rx))
}

#[test]
fn test_terminal_move_tears_down_group_and_room() {
    let (mut rooms, mut relay, room_id, (alice, _alice_rx), _bob) = lobby_and_session();

    let terminal = relay.broadcast_move(
        room_id,
        alice.id(),
        &serde_json::json!(4),
        TERMINAL_MARKER,
    );
    assert!(terminal);
    // The handler removes the room when the relay reports a terminal move.
    rooms.remove(room_id);

    assert!(!relay.contains(room_id));
    assert_eq!(rooms.room_count(), 0);
}

#[test]
fn test_game_over_reopens_room_but_keeps_session() {
    let (mut rooms, relay, room_id, _alice, _bob) = lobby_and_session();

    rooms.set_status(room_id, RoomStatus::Waiting);

    assert_eq!(rooms.info(room_id).unwrap().status, RoomStatus::Waiting);
    assert_eq!(relay.group_len(room_id), 2);
}

#[test]
fn test_restart_flips_room_back_to_playing() {
    let (mut rooms, mut relay, room_id, (alice, mut alice_rx), (_bob, mut bob_rx)) =
        lobby_and_session();
    rooms.set_status(room_id, RoomStatus::Waiting);

    if relay.restart(room_id, &alice) {
        rooms.set_status(room_id, RoomStatus::Playing);
    }

    assert_eq!(rooms.info(room_id).unwrap().status, RoomStatus::Playing);
    assert_eq!(next_event(&mut bob_rx)["symbol"], "X");
    assert_eq!(next_event(&mut alice_rx)["symbol"], "O");
}

#[test]
fn test_host_disconnect_notifies_peer_and_transfers_room() {
    let (mut rooms, mut relay, room_id, (alice, _alice_rx), (_bob, mut bob_rx)) =
        lobby_and_session();

    // The handler's teardown sequence for alice's lobby connection.
    let affected = relay.remove_conn(alice.id(), Some("alice"));
    rooms.remove_user_from_all("alice");

    assert_eq!(affected, vec![room_id]);
    // Exactly one opponent_left, then silence.
    assert_eq!(next_event(&mut bob_rx)["type"], "opponent_left");
    assert!(bob_rx.try_recv().is_err());
    assert_eq!(relay.group_len(room_id), 1);

    // Bob inherited the room.
    let info = rooms.info(room_id).unwrap();
    assert_eq!(info.host, "bob");
    assert_eq!(info.players, vec!["bob"]);
}
