//! Error types for the protocol layer.

/// Errors from encoding or decoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a wire event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed bytes, or a payload that is valid
    /// for the codec but not shaped like an event map.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors from the length-prefixed frame state machine.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A payload was too large to describe with the 4-byte length prefix.
    #[error("payload of {size} bytes exceeds the u32 frame length")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
    },

    /// A decoded length prefix exceeded the configured maximum. Rejected
    /// before any body allocation so an adversarial peer cannot make us
    /// reserve unbounded buffers.
    #[error("frame length {length} exceeds maximum {max}")]
    FrameTooLarge {
        /// The advertised body length.
        length: u32,
        /// The configured ceiling.
        max: u32,
    },

    /// The decoder already rejected a frame on this stream; the byte
    /// boundary is lost and no further frames can be recovered.
    #[error("frame decoder poisoned by an earlier invalid frame")]
    Poisoned,
}
