//! In-memory duplex streams for loopback wiring and tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::ByteStream;

/// One direction of a memory duplex: a shared byte queue plus a closed
/// flag set when the writing side goes away.
struct Direction {
    buf: Mutex<VecDeque<u8>>,
    closed: AtomicBool,
}

impl Direction {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            buf: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        })
    }
}

/// An in-memory [`ByteStream`], created in connected pairs by
/// [`memory_pair`].
///
/// Behaves like a loopback socket: unread bytes queue up, reads on an
/// empty queue report `WouldBlock`, and dropping one side makes the
/// peer's reads return `Ok(0)` (orderly close) once the queue is empty.
/// The two halves may live on different threads.
pub struct MemoryStream {
    read: Arc<Direction>,
    write: Arc<Direction>,
}

/// Creates a connected pair of in-memory streams.
pub fn memory_pair() -> (MemoryStream, MemoryStream) {
    let a_to_b = Direction::new();
    let b_to_a = Direction::new();
    (
        MemoryStream {
            read: Arc::clone(&b_to_a),
            write: Arc::clone(&a_to_b),
        },
        MemoryStream {
            read: a_to_b,
            write: b_to_a,
        },
    )
}

impl ByteStream for MemoryStream {
    fn try_recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut queue = self.read.buf.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.is_empty() {
            return if self.read.closed.load(Ordering::Acquire) {
                Ok(0) // peer gone and nothing left to read
            } else {
                Err(std::io::ErrorKind::WouldBlock.into())
            };
        }
        let n = buf.len().min(queue.len());
        for slot in buf.iter_mut().take(n) {
            *slot = queue.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn try_send(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.write.closed.load(Ordering::Acquire) {
            return Err(std::io::ErrorKind::BrokenPipe.into());
        }
        let mut queue = self.write.buf.lock().unwrap_or_else(PoisonError::into_inner);
        queue.extend(buf);
        Ok(buf.len())
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        // Signal orderly close to the peer in both directions.
        self.write.closed.store(true, Ordering::Release);
        self.read.closed.store(true, Ordering::Release);
    }
}
