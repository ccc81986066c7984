//! Codec trait and the JSON implementation.
//!
//! The phone client only speaks JSON text frames, so encoding produces a
//! `String` rather than raw bytes. Decoding accepts bytes because the
//! transport hands over whatever frame arrived, text or binary.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes outbound values to text and decodes inbound bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a received frame.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use wolfden_protocol::{ActionKind, Codec, InboundAction, JsonCodec};
///
/// let codec = JsonCodec;
/// let action: InboundAction = codec
///     .decode(br#"{"deviceId":"P1","action":"restart","targetId":""}"#)
///     .unwrap();
/// assert_eq!(action.action, ActionKind::Restart);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

/// Decodes an inbound action and rejects the ones without a device id.
///
/// Every action, `connect` included, is attributed through `deviceId`;
/// an empty one cannot be routed to a participant.
pub fn decode_action<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<crate::InboundAction, ProtocolError> {
    let action: crate::InboundAction = codec.decode(data)?;
    if action.device_id.as_str().is_empty() {
        return Err(ProtocolError::InvalidMessage("empty deviceId".into()));
    }
    Ok(action)
}
