//! Codec trait and implementations for serializing replicated messages.
//!
//! The session layer never touches bytes directly. It hands an
//! [`Envelope`](crate::Envelope) to a [`Codec`] and passes the result to the
//! network collaborator, so swapping JSON for a binary format later does not
//! touch the match core.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because the codec lives inside the match server
/// task for the whole match.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, which makes replicated state easy to inspect while
/// debugging a desync. Behind the `json` feature (enabled by default).
///
/// ```rust
/// use deathrope_protocol::{Codec, Envelope, JsonCodec, MatchMessage};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 1,
///     tick: 120,
///     payload: MatchMessage::RoundStarted { round: 0 },
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
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
    use crate::{Envelope, MatchMessage};

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<Envelope, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_message_type_fails() {
        let raw = br#"{"seq":1,"tick":0,"payload":{"type":"Teleport"}}"#;
        let result: Result<Envelope, _> = JsonCodec.decode(raw);
        assert!(result.is_err(), "unknown message types must not decode");
    }

    #[test]
    fn test_encode_produces_tagged_payload() {
        let envelope = Envelope {
            seq: 3,
            tick: 42,
            payload: MatchMessage::RoundAdvanced {
                round: 2,
                round_limit: 3,
            },
        };
        let bytes = JsonCodec.encode(&envelope).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["payload"]["type"], "RoundAdvanced");
        assert_eq!(value["payload"]["round"], 2);
    }
}
