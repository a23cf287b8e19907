//! Error types for the transport layer.

use tableforge_protocol::FrameError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding a listening socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Opening a client connection failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// Reading from or writing to an established stream failed. The
    /// endpoint transitions to `Closed` when this is returned.
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent bytes that violate the framing rules (typically an
    /// oversized length prefix).
    #[error(transparent)]
    Frame(#[from] FrameError),
}
