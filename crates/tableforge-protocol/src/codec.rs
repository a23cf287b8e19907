//! Codec trait and the default JSON implementation.
//!
//! The framing layer moves opaque payload bytes; a codec decides what
//! those bytes look like. The core treats the codec as a replaceable
//! encode/decode pair behind the [`Codec`] trait — the lineage of this
//! system has shipped JSON, a homegrown binary format and MessagePack over
//! the same framing, and nothing outside this module noticed.

use crate::{ProtocolError, WireEvent};

/// Converts wire events to payload bytes and back.
pub trait Codec: 'static {
    /// Serializes a wire event into a frame payload.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] if the event cannot be represented in
    /// this format.
    fn encode(&self, event: &WireEvent) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame payload back into a wire event.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] if the bytes are malformed or not shaped
    /// like an event map.
    fn decode(&self, data: &[u8]) -> Result<WireEvent, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json`.
///
/// Human-readable, so a wire capture of a session is directly legible —
/// valuable when debugging a desynchronized board. Behind the `json`
/// feature flag (enabled by default); binary codecs can slot in without
/// touching the framing or adapter layers.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, event: &WireEvent) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(event).map_err(ProtocolError::Encode)
    }

    fn decode(&self, data: &[u8]) -> Result<WireEvent, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use tableforge_events::fields;

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let wire = WireEvent {
            name: "game-event-update".into(),
            fields: fields! { "board" => "dungeon-1", "turn" => 12 },
        };
        let bytes = codec.encode(&wire).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), wire);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let err = JsonCodec.decode(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_json_codec_rejects_non_map_payload() {
        assert!(JsonCodec.decode(b"[1, 2, 3]").is_err());
    }
}
