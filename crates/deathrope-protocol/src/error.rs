//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding replicated messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed bytes, missing fields, or a
    /// message shape this build does not know.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but makes no sense at the protocol level,
    /// e.g. a snapshot whose round counter exceeds its round limit.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
