//! TCP listener wrapper.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::{ConnId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Accepts incoming TCP connections and tags each with a [`ConnId`].
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    ///
    /// Useful with a `:0` bind in tests.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection.
    pub async fn accept(&self) -> Result<TcpConnection, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnId::new(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted connection");

        Ok(TcpConnection { id, stream, peer })
    }
}

/// A single accepted TCP connection.
pub struct TcpConnection {
    id: ConnId,
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    /// Returns this connection's unique identifier.
    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Returns the remote peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Splits the connection into its read and write halves.
    ///
    /// The read half stays with the request loop; the write half is handed
    /// to the writer task (see [`drain_outbound`](crate::drain_outbound)).
    pub fn into_split(self) -> (ConnId, OwnedReadHalf, OwnedWriteHalf) {
        let (read, write) = self.stream.into_split();
        (self.id, read, write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{read_frame, write_frame};

    #[tokio::test]
    async fn test_accept_assigns_distinct_ids() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        let c1 = TcpStream::connect(addr);
        let c2 = TcpStream::connect(addr);
        let (r1, r2) = tokio::join!(c1, c2);
        r1.unwrap();
        r2.unwrap();

        let a = transport.accept().await.unwrap();
        let b = transport.accept().await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_frames_flow_over_accepted_connection() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            write_frame(&mut stream, b"ping").await.unwrap();
            read_frame(&mut stream).await.unwrap().unwrap()
        });

        let conn = transport.accept().await.unwrap();
        let (_, mut read, mut write) = conn.into_split();
        let frame = read_frame(&mut read).await.unwrap().unwrap();
        assert_eq!(frame, b"ping");
        write_frame(&mut write, b"pong").await.unwrap();

        assert_eq!(client.await.unwrap(), b"pong");
    }
}
