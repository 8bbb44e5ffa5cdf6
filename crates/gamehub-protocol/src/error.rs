//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// A decode failure on a live connection is treated as a transport fault by
/// callers: logged, never echoed back to the peer that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a value into payload bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed — malformed JSON, a missing field, or an
    /// unknown command tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
