//! Per-connection outbound channel.
//!
//! All writes to a client funnel through one channel drained by a single
//! writer task, so a frame pushed from another connection's handler (a relay
//! notification, say) never interleaves with a frame the owning handler is
//! writing. Pushing is non-blocking and best-effort: once the client is gone
//! the channel closes and sends are silently dropped, which is exactly the
//! semantics broadcast callers want.

use std::path::PathBuf;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use crate::{ConnId, frame};

/// One item queued for a client's writer task.
#[derive(Debug)]
pub enum Outbound {
    /// A single message frame.
    Frame(Vec<u8>),

    /// A message frame immediately followed by a raw file stream.
    ///
    /// Queued as one unit so nothing can land between the reply and the
    /// file bytes on the wire (the download contract).
    FrameThenFile { frame: Vec<u8>, path: PathBuf },
}

/// Cheaply clonable handle for pushing outbound data to one client.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ClientHandle {
    /// Creates a handle and the receiving end for its writer task.
    pub fn new(id: ConnId) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    /// The id of the connection this handle writes to.
    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Queues a message frame. Dropped silently if the client is gone.
    pub fn push_frame(&self, frame: Vec<u8>) {
        let _ = self.tx.send(Outbound::Frame(frame));
    }

    /// Queues a message frame with a file stream directly behind it.
    pub fn push_frame_then_file(&self, frame: Vec<u8>, path: PathBuf) {
        let _ = self.tx.send(Outbound::FrameThenFile { frame, path });
    }
}

/// Drains a connection's outbound channel into its write half.
///
/// Runs until the channel closes (every [`ClientHandle`] dropped) or a write
/// fails. Write failures end the task; the reader side notices the dead
/// connection on its own.
pub async fn drain_outbound<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Outbound>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = rx.recv().await {
        let result = match item {
            Outbound::Frame(payload) => frame::write_frame(&mut writer, &payload).await,
            Outbound::FrameThenFile { frame: payload, path } => {
                match frame::write_frame(&mut writer, &payload).await {
                    Ok(()) => frame::send_file(&mut writer, &path).await.map(|_| ()),
                    Err(e) => Err(e),
                }
            }
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "outbound write failed, stopping writer");
            break;
        }
    }
}
