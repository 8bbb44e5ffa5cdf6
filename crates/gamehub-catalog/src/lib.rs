//! Durable catalog for GameHub.
//!
//! One in-memory store holding accounts, game records, reviews, and play
//! history, snapshotted to a JSON file on every mutation. Game artifacts
//! live next to it on disk, one file per game id.
//!
//! The store is plain synchronous code with no locking of its own — the
//! server wraps it (together with the other registries) in the single
//! process-wide guard, and snapshot writes are small enough to happen
//! inline.

mod error;
mod store;

pub use error::CatalogError;
pub use store::{CatalogStore, PlayRecord};
