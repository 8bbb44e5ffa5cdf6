//! Per-connection handler: request loop, dispatch, and disconnect cleanup.
//!
//! Each accepted connection gets its own task running [`handle_connection`].
//! The flow is:
//!   1. Split the stream; spawn a writer task over the outbound channel
//!   2. Loop: read frame → decode [`Request`] → dispatch
//!   3. On EOF, read error, or malformed input: exit the loop silently
//!   4. Run disconnect cleanup under the state guard
//!
//! The guard is taken per request and dropped before the next read, so one
//! slow client never stalls the others. The two file-transfer commands are
//! the only places a request body touches the socket directly, and both do
//! so *outside* the guard.

use std::sync::Arc;

use gamehub_catalog::CatalogError;
use gamehub_protocol::{Codec, Reply, Request, Role, RoomStatus, Status};
use gamehub_session::SessionError;
use gamehub_transport::frame::{read_frame, receive_file};
use gamehub_transport::{ClientHandle, TcpConnection, drain_outbound};
use tokio::net::tcp::OwnedReadHalf;

use crate::HubError;
use crate::server::ServerState;

/// What the handler remembers about its connection between requests.
struct ConnContext {
    handle: ClientHandle,
    /// Set by a successful login; cleared if the connection relogs.
    user: Option<(Role, String)>,
    /// Username asserted by a relay `game_join` on this socket. Game
    /// processes never log in, but their relay entries still need cleanup
    /// when the socket dies.
    relay_user: Option<String>,
}

impl ConnContext {
    fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|(_, u)| u.as_str())
    }
}

/// Encodes a reply and queues it on the client's outbound channel.
fn send(state: &ServerState, ctx: &ConnContext, reply: &Reply) {
    match state.codec.encode(reply) {
        Ok(bytes) => ctx.handle.push_frame(bytes),
        Err(e) => tracing::error!(error = %e, "reply encode failed"),
    }
}

/// Handles a single connection from accept to teardown.
pub(crate) async fn handle_connection(conn: TcpConnection, state: Arc<ServerState>) {
    let peer = conn.peer_addr();
    let (conn_id, mut reader, writer) = conn.into_split();
    tracing::debug!(%conn_id, %peer, "handling connection");

    let (handle, outbound_rx) = ClientHandle::new(conn_id);
    tokio::spawn(drain_outbound(writer, outbound_rx));

    let mut ctx = ConnContext {
        handle,
        user: None,
        relay_user: None,
    };

    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "read failed");
                break;
            }
        };

        let request: Request = match state.codec.decode(&frame) {
            Ok(request) => request,
            Err(e) => {
                // Malformed input is a transport fault: logged for
                // operators, never answered, connection torn down.
                tracing::warn!(%conn_id, error = %e, "malformed request");
                break;
            }
        };

        if let Err(e) = dispatch(&state, &mut ctx, &mut reader, request).await {
            tracing::warn!(%conn_id, error = %e, "request failed, closing connection");
            break;
        }
    }

    disconnect_cleanup(&state, &ctx).await;
    // Dropping `ctx` releases this task's frame-channel handle. Cleanup
    // already removed the relay's clones, so the writer drains and exits.
}

/// Routes one request. `Err` only for transport-fatal conditions — every
/// client-visible failure is already a `status: fail` reply.
async fn dispatch(
    state: &Arc<ServerState>,
    ctx: &mut ConnContext,
    reader: &mut OwnedReadHalf,
    request: Request,
) -> Result<(), HubError> {
    match request {
        // -- Accounts ---------------------------------------------------
        Request::Login {
            role,
            username,
            password,
        } => {
            let reply = {
                let mut hub = state.hub.lock().await;
                // A connection may relog as someone else: release the old
                // identity first so it doesn't linger until teardown.
                if let Some((old_role, old_user)) = ctx.user.take() {
                    hub.online.release(old_role, &old_user, ctx.handle.id());
                }
                if hub.online.is_online(role, &username) {
                    Reply::fail(SessionError::AlreadyLoggedIn)
                } else {
                    match hub.catalog.verify_login(role, &username, &password) {
                        Ok(()) => match hub.online.claim(role, &username, ctx.handle.id()) {
                            Ok(()) => {
                                ctx.user = Some((role, username));
                                Reply::success("Login successful")
                            }
                            Err(e) => Reply::fail(e),
                        },
                        Err(e) => Reply::fail(e),
                    }
                }
            };
            send(state, ctx, &reply);
        }

        Request::Register {
            role,
            username,
            password,
        } => {
            let reply = match state
                .hub
                .lock()
                .await
                .catalog
                .register(role, &username, &password)
            {
                Ok(()) => Reply::success("Registration successful"),
                Err(e) => Reply::fail(e),
            };
            send(state, ctx, &reply);
        }

        // -- Catalog queries --------------------------------------------
        Request::ListGames => {
            let data = state.hub.lock().await.catalog.games_with_ratings();
            send(
                state,
                ctx,
                &Reply::Games {
                    status: Status::Success,
                    data,
                },
            );
        }

        Request::GetGameDetails { game_id } => {
            let reply = {
                let hub = state.hub.lock().await;
                match hub.catalog.game(game_id) {
                    Some(game) => Reply::GameDetails {
                        status: Status::Success,
                        game: game.clone(),
                        reviews: hub.catalog.reviews_for(game_id),
                    },
                    None => Reply::fail(CatalogError::GameNotFound(game_id)),
                }
            };
            send(state, ctx, &reply);
        }

        Request::MyGames => {
            let reply = match ctx.username() {
                Some(user) => Reply::OwnedGames {
                    status: Status::Success,
                    data: state.hub.lock().await.catalog.games_by_author(user),
                },
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        // -- Catalog mutations ------------------------------------------
        Request::UploadGame { meta } => {
            return upload_game(state, ctx, reader, meta).await;
        }

        Request::RemoveGame { game_id } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    match state.hub.lock().await.catalog.remove_game(&user, game_id) {
                        Ok(()) => Reply::success("Game deleted"),
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        Request::DownloadGame { game_id } => {
            // Version reply and artifact stream are queued as one unit so
            // no event can interleave between them on the wire.
            let found = {
                let hub = state.hub.lock().await;
                hub.catalog.game(game_id).map(|g| g.version).and_then(|version| {
                    let path = hub.catalog.artifact_path(game_id);
                    path.is_file().then_some((version, path))
                })
            };
            match found {
                Some((version, path)) => {
                    let reply = Reply::Download {
                        status: Status::Success,
                        version,
                    };
                    match state.codec.encode(&reply) {
                        Ok(bytes) => ctx.handle.push_frame_then_file(bytes, path),
                        Err(e) => tracing::error!(error = %e, "reply encode failed"),
                    }
                }
                None => send(
                    state,
                    ctx,
                    &Reply::fail(CatalogError::ArtifactMissing(game_id)),
                ),
            }
        }

        Request::SubmitReview {
            game_id,
            rating,
            comment,
        } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    match state
                        .hub
                        .lock()
                        .await
                        .catalog
                        .add_review(&user, game_id, rating, &comment)
                    {
                        Ok(()) => Reply::success("Review submitted"),
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        // -- Rooms ------------------------------------------------------
        Request::CreateRoom { game_id } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    let mut hub = state.hub.lock().await;
                    match hub.catalog.game(game_id).map(|g| g.name.clone()) {
                        Some(name) => Reply::RoomCreated {
                            status: Status::Success,
                            room_id: hub.rooms.create(game_id, &name, &user),
                        },
                        None => Reply::fail(CatalogError::GameNotFound(game_id)),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        Request::ListRooms => {
            let data = state.hub.lock().await.rooms.list();
            send(
                state,
                ctx,
                &Reply::Rooms {
                    status: Status::Success,
                    data,
                },
            );
        }

        Request::JoinRoom { room_id } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    match state.hub.lock().await.rooms.join(room_id, &user) {
                        Ok(game_id) => Reply::RoomJoined {
                            status: Status::Success,
                            game_id,
                        },
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        Request::LeaveRoom { room_id } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    match state.hub.lock().await.rooms.remove_member(room_id, &user) {
                        Ok(()) => Reply::ok(),
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        Request::GetRoomInfo { room_id } => {
            let reply = match state.hub.lock().await.rooms.info(room_id) {
                Ok(data) => Reply::Room {
                    status: Status::Success,
                    data,
                },
                Err(e) => Reply::fail(e),
            };
            send(state, ctx, &reply);
        }

        Request::StartGame { room_id } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    let mut hub = state.hub.lock().await;
                    match hub.rooms.start(room_id, &user) {
                        Ok((game_id, members)) => {
                            // Every member present at start gets a play-
                            // history entry; the pair is recorded at most
                            // once, and the snapshot is saved before the
                            // success reply goes out.
                            hub.catalog
                                .record_plays(game_id, members.iter().map(String::as_str));
                            Reply::ok()
                        }
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        Request::SendChat { room_id, msg } => {
            let reply = match ctx.username() {
                Some(user) => {
                    let user = user.to_string();
                    match state
                        .hub
                        .lock()
                        .await
                        .rooms
                        .append_chat(room_id, &user, &msg)
                    {
                        Ok(()) => Reply::ok(),
                        Err(e) => Reply::fail(e),
                    }
                }
                None => Reply::fail(SessionError::NotLoggedIn),
            };
            send(state, ctx, &reply);
        }

        // -- Relay (no direct replies, only pushed events) --------------
        Request::GameJoin { room_id, username } => {
            state
                .hub
                .lock()
                .await
                .relay
                .join(room_id, &username, ctx.handle.clone());
            ctx.relay_user = Some(username);
        }

        Request::GameMove {
            room_id,
            index,
            symbol,
        } => {
            let mut hub = state.hub.lock().await;
            let terminal = hub
                .relay
                .broadcast_move(room_id, ctx.handle.id(), &index, &symbol);
            if terminal {
                hub.rooms.remove(room_id);
            }
        }

        Request::GameOver { room_id } => {
            state
                .hub
                .lock()
                .await
                .rooms
                .set_status(room_id, RoomStatus::Waiting);
        }

        Request::GameRestart { room_id } => {
            let mut hub = state.hub.lock().await;
            if hub.relay.restart(room_id, &ctx.handle) {
                hub.rooms.set_status(room_id, RoomStatus::Playing);
            }
        }
    }

    Ok(())
}

/// The two-phase upload: metadata under the guard, `ready`, then the raw
/// artifact stream read directly off this connection.
async fn upload_game(
    state: &Arc<ServerState>,
    ctx: &mut ConnContext,
    reader: &mut OwnedReadHalf,
    meta: gamehub_protocol::GameMeta,
) -> Result<(), HubError> {
    let Some(username) = ctx.username().map(str::to_string) else {
        send(state, ctx, &Reply::fail(SessionError::NotLoggedIn));
        return Ok(());
    };

    let dest = {
        let mut hub = state.hub.lock().await;
        match hub.catalog.upsert_game(&username, &meta) {
            Ok(id) => hub.catalog.artifact_path(id),
            Err(e) => {
                send(state, ctx, &Reply::fail(e));
                return Ok(());
            }
        }
    };

    send(state, ctx, &Reply::ready());

    // Nothing else can be read on this connection until the stream
    // completes — this task *is* the reader.
    match receive_file(reader, &dest).await {
        Ok(true) => {
            send(state, ctx, &Reply::success("Upload complete"));
            Ok(())
        }
        Ok(false) => {
            // Connection lost mid-stream. The metadata is already durable;
            // a record whose artifact is missing or partial is the accepted
            // gap of the ready-then-stream design. Final status is pushed
            // best-effort into the (likely dead) channel.
            tracing::warn!(conn = %ctx.handle.id(), "upload stream ended short");
            send(state, ctx, &Reply::fail("Upload failed"));
            Ok(())
        }
        // Local disk fault: the socket position is now undefined, so the
        // connection can't be reused.
        Err(e) => Err(e.into()),
    }
}

/// Teardown: release the login, strip relay groups (notifying remaining
/// peers), and apply the departure policy to every room the user was in.
async fn disconnect_cleanup(state: &ServerState, ctx: &ConnContext) {
    let conn = ctx.handle.id();
    let mut hub = state.hub.lock().await;

    if let Some((role, username)) = &ctx.user {
        hub.online.release(*role, username, conn);
    }

    let relay_name = ctx.username().or(ctx.relay_user.as_deref());
    let affected = hub.relay.remove_conn(conn, relay_name);

    if let Some(username) = ctx.username() {
        hub.rooms.remove_user_from_all(username);
    }

    tracing::info!(%conn, sessions = affected.len(), "disconnect cleanup complete");
}
