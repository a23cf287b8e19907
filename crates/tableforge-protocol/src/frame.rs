//! Length-prefixed message framing.
//!
//! TCP is a byte stream; events are discrete. Every wire message therefore
//! travels as a frame:
//!
//! ```text
//! Frame := LEN (u32, big-endian) || PAYLOAD (LEN bytes)
//! ```
//!
//! A frame is atomic — it is either fully available or not yet decodable.
//! [`FrameDecoder`] is a pure two-state machine over already-available
//! bytes: it never blocks and never asks for I/O, it is simply fed
//! whatever the socket produced and emits the payloads that completed.
//! Chunk boundaries carry no meaning: one byte at a time and a dozen
//! frames in one read both decode to the same sequence.

use crate::FrameError;

/// Default ceiling for a single frame body: 16 MiB, comfortably above the
/// largest board texture the resource cache ships, far below anything an
/// adversarial length prefix could ask us to allocate.
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Size of the length prefix.
const LEN_PREFIX: usize = 4;

/// Wraps a payload in a length-prefixed frame.
///
/// # Errors
///
/// [`FrameError::PayloadTooLarge`] if the payload cannot be described by a
/// `u32` length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
    })?;
    let mut frame = Vec::with_capacity(LEN_PREFIX + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Where the decoder is inside the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Accumulating the 4-byte length prefix.
    AwaitingLength,
    /// Accumulating exactly `body_len` payload bytes.
    AwaitingBody {
        /// Decoded body length of the frame in progress.
        body_len: usize,
    },
}

/// Incremental frame decoder.
///
/// Feed it raw reads as they arrive; collect complete payloads as they
/// fall out. Partial state survives across calls, so resuming after a
/// short read is the normal case, not an error.
#[derive(Debug)]
pub struct FrameDecoder {
    state: ReadState,
    /// Bytes received but not yet consumed by a completed prefix or body.
    buf: Vec<u8>,
    max_frame_len: u32,
    poisoned: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder with [`DEFAULT_MAX_FRAME_LEN`].
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Creates a decoder with an explicit frame-size ceiling.
    pub fn with_max_frame_len(max_frame_len: u32) -> Self {
        Self {
            state: ReadState::AwaitingLength,
            buf: Vec::new(),
            max_frame_len,
            poisoned: false,
        }
    }

    /// Consumes newly-read bytes, returning every payload they completed.
    ///
    /// Zero-length frames are valid and yield empty payloads.
    ///
    /// # Errors
    ///
    /// [`FrameError::FrameTooLarge`] when a length prefix exceeds the
    /// ceiling; the decoder is poisoned from then on, because the stream
    /// position no longer lines up with a frame boundary.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Vec<u8>>, FrameError> {
        if self.poisoned {
            return Err(FrameError::Poisoned);
        }
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        loop {
            match self.state {
                ReadState::AwaitingLength => {
                    if self.buf.len() < LEN_PREFIX {
                        break;
                    }
                    let mut prefix = [0u8; LEN_PREFIX];
                    prefix.copy_from_slice(&self.buf[..LEN_PREFIX]);
                    let length = u32::from_be_bytes(prefix);
                    if length > self.max_frame_len {
                        self.poisoned = true;
                        return Err(FrameError::FrameTooLarge {
                            length,
                            max: self.max_frame_len,
                        });
                    }
                    self.buf.drain(..LEN_PREFIX);
                    self.state = ReadState::AwaitingBody {
                        body_len: length as usize,
                    };
                }
                ReadState::AwaitingBody { body_len } => {
                    if self.buf.len() < body_len {
                        break;
                    }
                    let rest = self.buf.split_off(body_len);
                    frames.push(std::mem::replace(&mut self.buf, rest));
                    self.state = ReadState::AwaitingLength;
                }
            }
        }
        Ok(frames)
    }

    /// Whether the decoder sits mid-frame (a truncated peer close would
    /// lose data here).
    pub fn is_mid_frame(&self) -> bool {
        !self.buf.is_empty() || self.state != ReadState::AwaitingLength
    }

    /// Discards all partial state, e.g. when the endpoint closes.
    pub fn reset(&mut self) {
        self.state = ReadState::AwaitingLength;
        self.buf.clear();
        self.poisoned = false;
    }
}
