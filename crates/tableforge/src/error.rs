//! Unified error type for the Tableforge facade.

use tableforge_events::EventError;
use tableforge_protocol::ProtocolError;
use tableforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tableforge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TableforgeError {
    /// A dispatch-level error (a handler failed under the propagating
    /// policy).
    #[error(transparent)]
    Event(#[from] EventError),

    /// A protocol-level error (encode, decode, framing).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A transport-level error (bind, connect, accept, stream I/O).
    #[error(transparent)]
    Transport(#[from] TransportError),
}
