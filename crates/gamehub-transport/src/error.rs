//! Error types for the transport layer.

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the connection mid-frame. A clean close at a frame
    /// boundary is not an error (readers report it as `None`).
    #[error("connection closed mid-frame")]
    TruncatedFrame,

    /// A frame exceeds the 4-byte length prefix's range.
    #[error("frame of {0} bytes exceeds the length prefix range")]
    FrameTooLarge(usize),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Reading or writing a streamed file on local disk failed.
    #[error("file I/O failed: {0}")]
    FileIo(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
