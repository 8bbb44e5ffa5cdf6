//! Length-prefixed framing and raw file streaming.
//!
//! Two envelopes share each connection:
//!
//! - **Message frame**: 4-byte big-endian length + payload bytes. The
//!   payload is opaque here; the protocol layer gives it meaning.
//! - **File stream**: 8-byte big-endian size + raw bytes, sent in bounded
//!   chunks. Used for game artifact upload/download.
//!
//! Framing is the only structural guarantee this module makes: a reader
//! either gets a whole frame or none at all. Content validation belongs to
//! the callers.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TransportError;

/// Chunk size for file streaming. No protocol significance — both ends
/// only care about the size prefix.
const CHUNK_SIZE: usize = 4096;

/// Reads one message frame.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly at a
/// frame boundary.
///
/// # Errors
/// - [`TransportError::TruncatedFrame`] if the connection drops after the
///   length prefix but before the full payload arrives.
/// - [`TransportError::ReceiveFailed`] on any other I/O failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::ReceiveFailed(e)),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(Some(payload)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(TransportError::TruncatedFrame)
        }
        Err(e) => Err(TransportError::ReceiveFailed(e)),
    }
}

/// Writes one message frame: 4-byte big-endian length, then the payload.
///
/// # Errors
/// [`TransportError::FrameTooLarge`] if the payload doesn't fit the prefix,
/// [`TransportError::SendFailed`] on I/O failure.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .map_err(|_| TransportError::FrameTooLarge(payload.len()))?;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(TransportError::SendFailed)?;
    writer
        .write_all(payload)
        .await
        .map_err(TransportError::SendFailed)?;
    writer.flush().await.map_err(TransportError::SendFailed)
}

/// Streams a file: 8-byte big-endian size, then the contents in chunks.
///
/// Returns `Ok(false)` without writing anything if `path` is not an
/// existing regular file.
///
/// # Errors
/// [`TransportError::SendFailed`] if the peer becomes unreachable,
/// [`TransportError::FileIo`] if reading the file itself fails.
pub async fn send_file<W>(writer: &mut W, path: &Path) -> Result<bool, TransportError>
where
    W: AsyncWrite + Unpin,
{
    let meta = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        _ => return Ok(false),
    };

    writer
        .write_all(&meta.len().to_be_bytes())
        .await
        .map_err(TransportError::SendFailed)?;

    let mut file = File::open(path).await.map_err(TransportError::FileIo)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await.map_err(TransportError::FileIo)?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(TransportError::SendFailed)?;
    }
    writer.flush().await.map_err(TransportError::SendFailed)?;
    Ok(true)
}

/// Receives a streamed file into `dest`, creating parent directories.
///
/// Returns `Ok(true)` once exactly the announced number of bytes has been
/// written, `Ok(false)` if the connection is lost before that. A `false`
/// may leave a partial file at `dest`; callers decide what to do with it.
///
/// # Errors
/// [`TransportError::FileIo`] if local disk I/O fails. The socket position
/// is undefined after this error — callers must tear the connection down.
pub async fn receive_file<R>(reader: &mut R, dest: &Path) -> Result<bool, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut size_buf = [0u8; 8];
    if reader.read_exact(&mut size_buf).await.is_err() {
        return Ok(false);
    }
    let size = u64::from_be_bytes(size_buf);

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TransportError::FileIo)?;
        }
    }
    let mut file = File::create(dest).await.map_err(TransportError::FileIo)?;

    let mut remaining = size;
    let mut buf = vec![0u8; CHUNK_SIZE];
    while remaining > 0 {
        let want = remaining.min(CHUNK_SIZE as u64) as usize;
        if reader.read_exact(&mut buf[..want]).await.is_err() {
            return Ok(false);
        }
        file.write_all(&buf[..want])
            .await
            .map_err(TransportError::FileIo)?;
        remaining -= want as u64;
    }
    file.flush().await.map_err(TransportError::FileIo)?;
    Ok(true)
}
