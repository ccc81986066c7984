//! Error types for the protocol layer.

/// Errors that can occur while turning wire bytes into actions and views
/// into wire text.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes from a device were not a valid inbound action.
    ///
    /// Common causes: malformed JSON, an unknown `action` name, or a
    /// missing `deviceId`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but makes no sense at the protocol level,
    /// e.g. an empty device id.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
