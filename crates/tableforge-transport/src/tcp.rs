//! TCP byte streams and the listening-side acceptor.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::{ByteStream, Endpoint, TransportError};

/// A `TcpStream` in non-blocking mode.
///
/// Non-blocking is not an optimization here, it is the contract: the
/// owning domain's tick cadence must never be hostage to a stalled peer.
/// `TCP_NODELAY` is set because event frames are small and latency-bound.
pub struct TcpByteStream {
    stream: TcpStream,
}

impl TcpByteStream {
    /// Opens a client connection.
    ///
    /// The connect itself is the one blocking call in the transport — it
    /// happens once, before the domain loop starts.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).map_err(TransportError::Connect)?;
        Self::from_stream(stream)
    }

    /// Wraps an already-established stream (e.g. a freshly accepted one).
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        stream.set_nonblocking(true).map_err(TransportError::Io)?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;
        Ok(Self { stream })
    }

    /// The remote peer's address.
    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

impl ByteStream for TcpByteStream {
    fn try_recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }

    fn try_send(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }
}

/// Accepts incoming connections without blocking, producing one framed
/// [`Endpoint`] per peer.
pub struct Acceptor {
    listener: TcpListener,
}

impl Acceptor {
    /// Binds a non-blocking listener to `addr`.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).map_err(TransportError::Bind)?;
        listener.set_nonblocking(true).map_err(TransportError::Io)?;
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }
        Ok(Self { listener })
    }

    /// Accepts at most one pending connection.
    ///
    /// Returns `Ok(None)` when nobody is waiting — call again on the next
    /// tick.
    pub fn try_accept(&self) -> Result<Option<Endpoint<TcpByteStream>>, TransportError> {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                debug!(%addr, "accepted connection");
                Ok(Some(Endpoint::new(TcpByteStream::from_stream(stream)?)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::Accept(e)),
        }
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
