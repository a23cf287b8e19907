//! Non-blocking framed socket endpoints.
//!
//! This crate turns raw byte streams into whole-frame conversations
//! without ever blocking the caller. The pieces:
//!
//! - [`ByteStream`]: the minimal non-blocking duplex contract.
//! - [`Endpoint`]: resumable framed I/O over any byte stream — one
//!   partial read and one partial write per [`Endpoint::poll_once`].
//! - [`TcpByteStream`] / [`Acceptor`]: the TCP realization.
//! - [`memory_pair`]: an in-process loopback for tests and local wiring.
//!
//! Everything here is payload-agnostic: frames are opaque byte vectors,
//! and encoding them into events is the protocol layer's business.

mod endpoint;
mod error;
mod memory;
mod tcp;

pub use endpoint::{Endpoint, EndpointState};
pub use error::TransportError;
pub use memory::{MemoryStream, memory_pair};
pub use tcp::{Acceptor, TcpByteStream};

/// A non-blocking duplex byte stream.
///
/// Both operations must return immediately. `WouldBlock` (or
/// `Interrupted`) means "no progress right now, try again later" and is
/// never fatal; any other error is. Implementations may transfer fewer
/// bytes than asked.
pub trait ByteStream {
    /// Reads available bytes into `buf`.
    ///
    /// `Ok(0)` means the peer performed an orderly shutdown — there will
    /// never be more data.
    fn try_recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Writes as much of `buf` as the stream will take right now.
    fn try_send(&mut self, buf: &[u8]) -> std::io::Result<usize>;
}
