//! One side of a framed duplex connection.

use std::collections::VecDeque;

use tableforge_protocol::{FrameDecoder, encode_frame};
use tracing::{debug, trace};

use crate::{ByteStream, TransportError};

/// Bytes asked of the stream per read attempt.
const READ_CHUNK: usize = 8 * 1024;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// The stream is live; frames may flow both ways.
    Open,
    /// The peer disconnected, an error occurred, or [`Endpoint::close`]
    /// was called. Terminal.
    Closed,
}

/// A duplex byte-stream wrapper that produces and consumes whole frames.
///
/// The endpoint never blocks and never loops waiting for data: each
/// [`poll_once`](Self::poll_once) performs at most one partial read and
/// one partial write, and everything in between — half a length prefix,
/// a body split across a dozen reads, a frame the kernel only accepted
/// three bytes of — is ordinary resumable state. The external driving
/// loop calls `poll_once` at its tick cadence.
///
/// Delivery is best-effort: closing (gracefully or on error) discards
/// undelivered frames in both directions, and nothing partial is ever
/// surfaced.
pub struct Endpoint<S: ByteStream> {
    stream: S,
    decoder: FrameDecoder,
    /// Decoded payloads awaiting [`try_take_incoming`](Self::try_take_incoming).
    incoming: VecDeque<Vec<u8>>,
    /// Framed byte buffers awaiting transmission.
    outgoing: VecDeque<Vec<u8>>,
    /// How much of the head outgoing buffer has already been sent.
    write_pos: usize,
    state: EndpointState,
}

impl<S: ByteStream> Endpoint<S> {
    /// Wraps an already-connected non-blocking stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
            incoming: VecDeque::new(),
            outgoing: VecDeque::new(),
            write_pos: 0,
            state: EndpointState::Open,
        }
    }

    /// Frames a payload and queues it for transmission. Never blocks.
    ///
    /// After close this is a silent no-op — the frames would never be
    /// delivered anyway.
    ///
    /// # Errors
    ///
    /// Only if the payload itself cannot be framed (larger than the u32
    /// length prefix allows).
    pub fn enqueue_outgoing(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.state == EndpointState::Closed {
            trace!("discarding outgoing payload on closed endpoint");
            return Ok(());
        }
        self.outgoing.push_back(encode_frame(payload)?);
        Ok(())
    }

    /// One reactor iteration: at most one read and one write attempt.
    ///
    /// Completed inbound frames land in the incoming queue; the head
    /// outbound buffer advances by however much the stream accepted.
    /// Returns without doing anything once closed.
    ///
    /// # Errors
    ///
    /// I/O failures and framing violations close the endpoint and are
    /// returned; an orderly peer shutdown closes it silently.
    pub fn poll_once(&mut self) -> Result<(), TransportError> {
        if self.state == EndpointState::Closed {
            return Ok(());
        }
        self.poll_read()?;
        if self.state == EndpointState::Open {
            self.poll_write()?;
        }
        Ok(())
    }

    fn poll_read(&mut self) -> Result<(), TransportError> {
        let mut buf = [0u8; READ_CHUNK];
        match self.stream.try_recv(&mut buf) {
            Ok(0) => {
                debug!("peer closed connection");
                self.close();
            }
            Ok(n) => match self.decoder.feed(&buf[..n]) {
                Ok(frames) => {
                    for frame in frames {
                        trace!(len = frame.len(), "frame received");
                        self.incoming.push_back(frame);
                    }
                }
                Err(e) => {
                    self.close();
                    return Err(e.into());
                }
            },
            Err(e) if would_block(&e) => {}
            Err(e) => {
                self.close();
                return Err(e.into());
            }
        }
        Ok(())
    }

    fn poll_write(&mut self) -> Result<(), TransportError> {
        let Some(head) = self.outgoing.front() else {
            return Ok(());
        };
        match self.stream.try_send(&head[self.write_pos..]) {
            Ok(n) => {
                self.write_pos += n;
                if self.write_pos == head.len() {
                    trace!(len = head.len(), "frame sent");
                    self.outgoing.pop_front();
                    self.write_pos = 0;
                }
            }
            Err(e) if would_block(&e) => {}
            Err(e) => {
                self.close();
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Pops one decoded payload, if any completed.
    pub fn try_take_incoming(&mut self) -> Option<Vec<u8>> {
        self.incoming.pop_front()
    }

    /// Closes the endpoint and discards all buffered frames and partial
    /// state, in both directions.
    pub fn close(&mut self) {
        if self.state == EndpointState::Closed {
            return;
        }
        self.state = EndpointState::Closed;
        self.decoder.reset();
        self.incoming.clear();
        self.outgoing.clear();
        self.write_pos = 0;
        debug!("endpoint closed");
    }

    /// Whether the connection is still live.
    pub fn is_open(&self) -> bool {
        self.state == EndpointState::Open
    }

    /// Frames queued for transmission but not yet fully sent.
    pub fn pending_outgoing(&self) -> usize {
        self.outgoing.len()
    }

    /// Decoded payloads not yet taken.
    pub fn pending_incoming(&self) -> usize {
        self.incoming.len()
    }
}

fn would_block(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
    )
}
