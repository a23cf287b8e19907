//! # Tableforge Protocol
//!
//! The serialization boundary of Tableforge's transport:
//!
//! - **Framing** ([`encode_frame`], [`FrameDecoder`]) — length-prefixed
//!   message boundaries over a raw byte stream, resumable across partial
//!   reads.
//! - **Wire shape** ([`WireEvent`]) — the `{ "event": name, ...fields }`
//!   map every payload decodes to.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how payload bytes and wire
//!   events convert into each other; pluggable by design.
//!
//! This crate knows nothing about sockets or buses. It sits between the
//! transport (bytes) and the event layer (records):
//!
//! ```text
//! Endpoint (bytes) → FrameDecoder (payloads) → Codec (WireEvent) → Bus
//! ```

mod codec;
mod error;
mod frame;
mod wire;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{FrameError, ProtocolError};
pub use frame::{DEFAULT_MAX_FRAME_LEN, FrameDecoder, encode_frame};
pub use wire::WireEvent;
