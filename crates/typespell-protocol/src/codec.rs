//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and wire text. The rest of the
//! stack only sees the [`Codec`] trait, so a binary format could be
//! swapped in later without touching the gateway or room layers. The
//! wire is text (not bytes) because the protocol is JSON end to end.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to wire text and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a wire frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or
    /// doesn't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
