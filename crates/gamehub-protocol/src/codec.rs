//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and frame payload bytes. The rest of
//! the system only sees the [`Codec`] trait, so the serialization format is
//! swappable without touching handlers or managers. The hub's wire format is
//! UTF-8 JSON, so [`JsonCodec`] is the one in production use.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to payload bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into payload bytes.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes payload bytes back into a value.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] if the bytes are malformed or don't match
    /// the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
