//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and the bytes of a single frame.
//! The session layer only depends on the [`Codec`] trait, so a binary
//! format can replace JSON without touching anything above this crate.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by the
/// setup tasks of both players.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into the bytes of one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses compact JSON (via `serde_json`).
///
/// Compact output never contains a raw newline, which is what lets the TCP
/// transport use `\n` as its frame delimiter.
///
/// ## Example
///
/// ```rust
/// use broadside_protocol::{ClientMessage, Codec, Coordinate, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ClientMessage = codec
///     .decode(br#"{"type":"attack","coordinates":[3,5]}"#)
///     .unwrap();
/// assert_eq!(msg, ClientMessage::Attack { coordinates: Coordinate::new(3, 5) });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Coordinate, ServerMessage};

    #[test]
    fn test_encoded_frame_has_no_newline() {
        let msg = ServerMessage::Attacked {
            coordinates: Coordinate::new(1, 2),
            hit: true,
            message: "line one\nline two".into(),
        };
        let bytes = JsonCodec.encode(&msg).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }

    #[test]
    fn test_decode_error_is_decode_variant() {
        let result: Result<crate::ClientMessage, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
