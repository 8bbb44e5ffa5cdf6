//! # GameHub
//!
//! A multiplayer game-distribution and matchmaking hub: one long-lived TCP
//! server through which clients authenticate, publish and download game
//! artifacts, review games they have played, form lobby rooms, and relay
//! opaque turn data between external game processes.
//!
//! The layers, leaf-first:
//!
//! - `gamehub-transport` — framing, file streaming, outbound channels
//! - `gamehub-protocol` — typed requests, replies, and pushed events
//! - `gamehub-catalog` — the durable store (accounts, games, reviews, plays)
//! - `gamehub-session` — the online registry (single login per credential)
//! - `gamehub-room` — lobby rooms and the game-session relay
//!
//! This crate ties them together: the accept loop spawns one handler task
//! per connection, and every handler shares one guarded hub state so
//! cross-structure operations stay atomic.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gamehub::GameHubServerBuilder;
//!
//! # async fn run() -> Result<(), gamehub::HubError> {
//! let server = GameHubServerBuilder::new()
//!     .bind("0.0.0.0:12131")
//!     .data_dir("server_data")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::HubError;
pub use server::{DEFAULT_ADDR, GameHubServer, GameHubServerBuilder};
