//! The online registry: who holds an authenticated connection right now.

use std::collections::HashMap;

use gamehub_protocol::Role;
use gamehub_transport::ConnId;

use crate::SessionError;

/// Maps each logged-in (role, username) pair to its connection.
///
/// Entries are claimed on successful login and released on disconnect.
/// Not thread-safe by itself — the server keeps it behind the process-wide
/// state guard along with everything else.
#[derive(Debug, Default)]
pub struct OnlineRegistry {
    online: HashMap<(Role, String), ConnId>,
}

impl OnlineRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the pair currently holds a connection.
    pub fn is_online(&self, role: Role, username: &str) -> bool {
        self.online.contains_key(&(role, username.to_string()))
    }

    /// Claims the pair for a connection.
    ///
    /// # Errors
    /// [`SessionError::AlreadyLoggedIn`] if another connection holds it.
    pub fn claim(&mut self, role: Role, username: &str, conn: ConnId) -> Result<(), SessionError> {
        let key = (role, username.to_string());
        if self.online.contains_key(&key) {
            return Err(SessionError::AlreadyLoggedIn);
        }
        self.online.insert(key, conn);
        tracing::info!(%role, %username, %conn, "user online");
        Ok(())
    }

    /// Releases the pair, but only if it still maps to `conn`.
    ///
    /// The ownership check matters during teardown races: a user who
    /// relogged on a fresh socket must not be evicted when the old socket's
    /// cleanup finally runs.
    pub fn release(&mut self, role: Role, username: &str, conn: ConnId) {
        let key = (role, username.to_string());
        if self.online.get(&key) == Some(&conn) {
            self.online.remove(&key);
            tracing::info!(%role, %username, %conn, "user offline");
        }
    }

    /// Number of online users.
    pub fn len(&self) -> usize {
        self.online.len()
    }

    /// Returns `true` if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}
