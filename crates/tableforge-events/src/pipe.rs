//! Mirroring a bus across a thread boundary.
//!
//! Domains are single-threaded and a [`Bus`] never crosses threads, so two
//! domains talk by message passing: each side owns a [`Pipe`] whose sender
//! feeds the other side's receiver. The pipe subscribes to everything on
//! its local bus, ships `(name, fields)` pairs to the peer, and on every
//! tick re-posts whatever arrived from the peer.
//!
//! Because a re-posted event fires the local wildcard subscription again,
//! each pipe remembers the transport ids it injected and skips forwarding
//! them back — otherwise a single event would bounce between the two
//! domains forever.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::{trace, warn};

use crate::{Bus, Callback, EventId, Fields, TICK};

/// One event crossing a pipe: name plus fields. The transport id stays
/// behind — the receiving side mints its own when it re-posts.
pub type PipedEvent = (String, Fields);

/// Creates the two swapped channel pairs for a pair of [`Pipe`]s: the first
/// element's sender feeds the second element's receiver and vice versa.
pub fn channel_pair() -> (
    (Sender<PipedEvent>, Receiver<PipedEvent>),
    (Sender<PipedEvent>, Receiver<PipedEvent>),
) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();
    ((a_tx, a_rx), (b_tx, b_rx))
}

/// One end of a cross-domain event mirror.
///
/// Dropping the `Pipe` drops its subscriptions; the bus reclaims the dead
/// handles lazily and the peer's sends start failing silently (the peer
/// logs and carries on).
pub struct Pipe {
    _forward: Callback,
    _tick: Callback,
}

impl Pipe {
    /// Attaches a pipe end to `bus`.
    ///
    /// `tx` must be the peer's receiver counterpart and `rx` this side's,
    /// as produced by [`channel_pair`].
    pub fn new(bus: &Bus, tx: Sender<PipedEvent>, rx: Receiver<PipedEvent>) -> Self {
        // Ids this pipe itself posted locally; consumed (removed) when the
        // outbound path sees them, so the set never grows unbounded.
        let posted: Rc<RefCell<HashSet<EventId>>> = Rc::new(RefCell::new(HashSet::new()));

        let forward = {
            let posted = Rc::clone(&posted);
            Callback::closure(move |ev| {
                if ev.name() == TICK {
                    // Ticks never cross domains: each side keeps its own
                    // cadence, and a forwarded tick would double-drain.
                    return Ok(());
                }
                if posted.borrow_mut().remove(&ev.id()) {
                    trace!(event = ev.name(), id = %ev.id(), "not bouncing piped event back");
                    return Ok(());
                }
                if tx.send((ev.name().to_string(), ev.fields().clone())).is_err() {
                    // Peer domain is gone; best-effort delivery only.
                    warn!(event = ev.name(), "pipe peer disconnected; event not forwarded");
                }
                Ok(())
            })
        };
        bus.connect_any(&forward);

        let tick = {
            let posted = Rc::clone(&posted);
            let bus = bus.clone();
            Callback::closure(move |_| {
                while let Ok((name, fields)) = rx.try_recv() {
                    if let Some(id) = bus.post(&name, fields) {
                        posted.borrow_mut().insert(id);
                    }
                }
                Ok(())
            })
        };
        bus.connect(TICK, &tick);

        Self {
            _forward: forward,
            _tick: tick,
        }
    }
}
