//! Core protocol types for GameHub's wire format.
//!
//! Every message on a connection is a 4-byte-length-prefixed JSON object.
//! Client → server objects carry a `command` tag and decode to [`Request`].
//! Server → client objects are either a direct [`Reply`] to the request in
//! flight, or an unsolicited [`ServerEvent`] pushed on a relay connection
//! (tagged with `type`).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a catalog game record.
///
/// Allocated as the smallest unused positive integer, so ids freed by a
/// removal are eventually reused. `#[serde(transparent)]` keeps the wire
/// shape a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u32);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A unique identifier for a lobby room. Same allocation rule as [`GameId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Accounts and catalog records
// ---------------------------------------------------------------------------

/// The two account namespaces. Usernames are unique per role, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Player,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Developer => write!(f, "developer"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// How a published game presents itself when launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameKind {
    Gui,
    Cli,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gui => write!(f, "GUI"),
            Self::Cli => write!(f, "CLI"),
        }
    }
}

/// Upload metadata: what a developer sends ahead of the artifact stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
}

/// One published game in the catalog.
///
/// `version` starts at 1 and bumps each time the author re-uploads under
/// the same name. Only the author may mutate or remove the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub name: String,
    pub version: u32,
    pub author: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
}

/// A player's review of a game. At most one per (user, game) pair, and only
/// after that pair appears in the play history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub game_id: GameId,
    pub user: String,
    pub rating: u8,
    pub comment: String,
}

/// A catalog record plus its mean rating, as returned by `list_games`.
///
/// `rating` is the review average rounded to one decimal, `0.0` when the
/// game has no reviews yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameListEntry {
    #[serde(flatten)]
    pub game: GameRecord,
    pub rating: f64,
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Lobby room lifecycle:
///
/// ```text
/// waiting ──(start_game)──→ playing ──(game_over)──→ waiting
///                              ↑ ──(game_restart)──────┘
/// ```
///
/// Deletion (room emptied, or terminal relay move) is the implicit final
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new members.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

/// Snapshot of one lobby room, as returned by `list_rooms`/`get_room_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub game_id: GameId,
    pub game_name: String,
    pub host: String,
    /// Members in join order; the first member after a host departure
    /// inherits the host role.
    pub players: Vec<String>,
    pub status: RoomStatus,
    /// Most recent chat lines, oldest first, capped at 50.
    pub chat_history: Vec<String>,
}

// ---------------------------------------------------------------------------
// Request — client → server
// ---------------------------------------------------------------------------

/// Every command a client can issue, tagged by the `command` field.
///
/// `{"command": "join_room", "room_id": 3}` decodes to
/// `Request::JoinRoom { room_id: RoomId(3) }`. An unknown tag fails to
/// decode, which tears the connection down — there is no "unknown command"
/// reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    // -- Accounts --
    Login {
        role: Role,
        username: String,
        password: String,
    },
    Register {
        role: Role,
        username: String,
        password: String,
    },

    // -- Catalog --
    ListGames,
    GetGameDetails {
        game_id: GameId,
    },
    /// Phase one of an upload: after the `ready` reply the client streams
    /// the artifact as a raw file envelope on the same connection.
    UploadGame {
        meta: GameMeta,
    },
    MyGames,
    RemoveGame {
        game_id: GameId,
    },
    /// On success the version reply is immediately followed by the raw
    /// artifact stream, with no message in between.
    DownloadGame {
        game_id: GameId,
    },
    SubmitReview {
        game_id: GameId,
        rating: u8,
        comment: String,
    },

    // -- Rooms --
    CreateRoom {
        game_id: GameId,
    },
    ListRooms,
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    GetRoomInfo {
        room_id: RoomId,
    },
    StartGame {
        room_id: RoomId,
    },
    SendChat {
        room_id: RoomId,
        msg: String,
    },

    // -- Relay (issued by external game processes, not the lobby client) --
    GameJoin {
        room_id: RoomId,
        username: String,
    },
    GameMove {
        room_id: RoomId,
        /// Opaque turn payload — the game programs own its meaning.
        index: serde_json::Value,
        symbol: String,
    },
    GameOver {
        room_id: RoomId,
    },
    GameRestart {
        room_id: RoomId,
    },
}

// ---------------------------------------------------------------------------
// Reply — server → client, direct answer to a request
// ---------------------------------------------------------------------------

/// Outcome marker carried in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
    /// Upload handshake: metadata accepted, send the file now.
    Ready,
}

/// Every reply shape the hub produces.
///
/// Untagged: each variant serializes as its bare fields, so the wire shows
/// `{"status": "success", "room_id": 1}` rather than a variant wrapper.
/// Failures are always [`Reply::Message`] with `status: fail` and a
/// human-readable `msg` — never a protocol-level abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// `get_game_details`: the record plus its reviews.
    GameDetails {
        status: Status,
        game: GameRecord,
        reviews: Vec<Review>,
    },
    /// `download_game`: version of the artifact about to be streamed.
    Download { status: Status, version: u32 },
    /// `create_room`.
    RoomCreated { status: Status, room_id: RoomId },
    /// `join_room`: the game the room is bound to.
    RoomJoined { status: Status, game_id: GameId },
    /// `list_games`.
    Games {
        status: Status,
        data: Vec<GameListEntry>,
    },
    /// `my_games`.
    OwnedGames {
        status: Status,
        data: Vec<GameRecord>,
    },
    /// `list_rooms`.
    Rooms { status: Status, data: Vec<RoomInfo> },
    /// `get_room_info`.
    Room { status: Status, data: RoomInfo },
    /// Any success/failure with a human-readable message.
    Message { status: Status, msg: String },
    /// Bare status — `leave_room`, `start_game`, `send_chat`, and the
    /// upload `ready` handshake.
    Bare { status: Status },
}

impl Reply {
    /// A bare `{"status": "success"}`.
    pub fn ok() -> Self {
        Reply::Bare {
            status: Status::Success,
        }
    }

    /// The upload handshake `{"status": "ready"}`.
    pub fn ready() -> Self {
        Reply::Bare {
            status: Status::Ready,
        }
    }

    /// A success with a message.
    pub fn success(msg: impl Into<String>) -> Self {
        Reply::Message {
            status: Status::Success,
            msg: msg.into(),
        }
    }

    /// A failure with a human-readable reason.
    pub fn fail(msg: impl fmt::Display) -> Self {
        Reply::Message {
            status: Status::Fail,
            msg: msg.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent — server → client, unsolicited pushes on relay connections
// ---------------------------------------------------------------------------

/// Events the relay pushes without a matching request, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A two-party session formed (or restarted). `turn: true` means this
    /// recipient moves first.
    GameStart {
        symbol: String,
        opponent: String,
        turn: bool,
    },
    /// Another participant's turn payload, relayed verbatim.
    OpponentMove {
        index: serde_json::Value,
        symbol: String,
    },
    /// The other participant left the session.
    OpponentLeft,
}

// =========================================================================
// Tests
// =========================================================================
