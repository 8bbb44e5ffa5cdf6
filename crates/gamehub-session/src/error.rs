//! Error types for the session layer.
//!
//! `Display` strings double as the client-facing `msg` of a failure reply.

/// Errors that can occur in the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The (role, username) pair already holds a live connection.
    #[error("Account already logged in.")]
    AlreadyLoggedIn,

    /// The connection tried a command that needs an authenticated user.
    #[error("Not logged in")]
    NotLoggedIn,
}
