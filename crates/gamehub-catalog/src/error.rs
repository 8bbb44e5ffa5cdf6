//! Error types for the catalog layer.
//!
//! The `Display` strings double as the client-facing `msg` field of a
//! failure reply, so they are written for end users, not operators.

use gamehub_protocol::GameId;

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An account already exists under this role and username.
    #[error("Username already exists")]
    UsernameTaken,

    /// Unknown account or wrong password. The two cases are deliberately
    /// indistinguishable to the client.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No game record matches the given id (or name, for lookups by name).
    #[error("Game not found")]
    GameNotFound(GameId),

    /// A non-author tried to mutate or remove a game record.
    #[error("Permission denied")]
    PermissionDenied,

    /// Review submitted without a play-history entry for this game.
    #[error("You must play the game before reviewing it!")]
    MustPlayBeforeReview,

    /// The user already reviewed this game.
    #[error("You have already reviewed this game.")]
    AlreadyReviewed,

    /// Review rating outside the 1–5 range.
    #[error("Rating must be between 1 and 5")]
    InvalidRating(u8),

    /// The game record exists but its artifact is missing on disk.
    #[error("File not found")]
    ArtifactMissing(GameId),
}
