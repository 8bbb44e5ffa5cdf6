//! `GameHubServer` builder and accept loop.

use std::path::PathBuf;
use std::sync::Arc;

use gamehub_catalog::CatalogStore;
use gamehub_protocol::JsonCodec;
use gamehub_room::{GameRelay, RoomManager};
use gamehub_session::OnlineRegistry;
use gamehub_transport::TcpTransport;
use tokio::sync::Mutex;

use crate::HubError;
use crate::handler::handle_connection;

/// The hub's fixed well-known address: all interfaces, port 12131.
pub const DEFAULT_ADDR: &str = "0.0.0.0:12131";

/// All shared mutable state, behind one process-wide guard.
///
/// Deliberately a single `Mutex`, not one per structure: most operations
/// span structures (a terminal relay move deletes the group *and* its room;
/// starting a game writes rooms *and* the catalog; login consults catalog
/// *and* the online registry), and one guard keeps every read-modify-write
/// atomic with no lock-ordering rules to get wrong. The guard is never held
/// across socket reads or file streaming — outbound traffic goes through
/// the non-blocking per-connection channels, so holding it across a push is
/// fine.
pub(crate) struct HubState {
    pub(crate) catalog: CatalogStore,
    pub(crate) online: OnlineRegistry,
    pub(crate) rooms: RoomManager,
    pub(crate) relay: GameRelay,
}

/// Shared server state handed to each connection task.
pub(crate) struct ServerState {
    pub(crate) hub: Mutex<HubState>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a hub server.
pub struct GameHubServerBuilder {
    bind_addr: String,
    data_dir: PathBuf,
}

impl GameHubServerBuilder {
    /// Creates a builder with the default address and data directory.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            data_dir: PathBuf::from("server_data"),
        }
    }

    /// Sets the address to bind. `127.0.0.1:0` picks a free port (tests).
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the directory holding the catalog snapshot and game artifacts.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Binds the listener and loads the catalog.
    pub async fn build(self) -> Result<GameHubServer, HubError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        let catalog = CatalogStore::open(&self.data_dir);

        let state = Arc::new(ServerState {
            hub: Mutex::new(HubState {
                catalog,
                online: OnlineRegistry::new(),
                rooms: RoomManager::new(),
                relay: GameRelay::new(),
            }),
            codec: JsonCodec,
        });

        Ok(GameHubServer { transport, state })
    }
}

impl Default for GameHubServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running hub server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GameHubServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl GameHubServer {
    /// Creates a new builder.
    pub fn builder() -> GameHubServerBuilder {
        GameHubServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one task per connection, no ceiling.
    ///
    /// A failed accept is logged and the loop continues; a fault inside one
    /// handler never reaches the listener or other connections. Runs until
    /// the process is terminated.
    pub async fn run(self) -> Result<(), HubError> {
        tracing::info!("GameHub server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
