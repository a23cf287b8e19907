//! Bridges one framed endpoint onto one event bus.
//!
//! The adapter is the only place where the network and the dispatch core
//! meet, and it is deliberately a *transient connector*: it holds a `Bus`
//! clone and a shared reference to an [`Endpoint`], and when either side
//! of the bridge goes away the other is unaffected. Outbound, it
//! subscribes to the role's forwardable event names and ships them as
//! [`WireEvent`]s; inbound, a tick subscription drains whatever frames
//! completed since the last tick and posts them locally. Remote events
//! thereby travel the exact same dispatch path as local ones.
//!
//! Dropping the adapter drops its subscriptions — the bus purges the dead
//! handles lazily, the endpoint keeps working for whoever else holds it.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tableforge_events::{Bus, Callback, DISCONNECTED, Event, EventId, Fields, TICK};
use tableforge_protocol::{Codec, WireEvent};
use tableforge_transport::{ByteStream, Endpoint};
use tracing::{debug, trace, warn};

use crate::Role;

struct AdapterInner<S: ByteStream, C: Codec> {
    bus: Bus,
    /// `None` once the connection is gone and the reference released.
    endpoint: RefCell<Option<Rc<RefCell<Endpoint<S>>>>>,
    codec: C,
    role: Role,
    /// Inbound acceptance predicate; defaults to the role rule.
    check_in_event: Box<dyn Fn(&str) -> bool>,
    /// Transport ids this adapter posted from the wire. Consulted (and
    /// consumed) by the outbound path so a remote event that matches our
    /// own outbound names is not echoed straight back.
    posted: RefCell<HashSet<EventId>>,
    disconnect_announced: Cell<bool>,
}

impl<S: ByteStream, C: Codec> AdapterInner<S, C> {
    /// Forwards one locally-posted event onto the wire. Best-effort:
    /// encode failures and oversized payloads are logged and dropped.
    fn forward(&self, event: &Event) {
        if self.posted.borrow_mut().remove(&event.id()) {
            trace!(event = event.name(), id = %event.id(), "not echoing remote event back");
            return;
        }
        let endpoint = self.endpoint.borrow().clone();
        let Some(endpoint) = endpoint else {
            return;
        };
        let wire = WireEvent::from_event(event);
        match self.codec.encode(&wire) {
            Ok(payload) => {
                if let Err(e) = endpoint.borrow_mut().enqueue_outgoing(&payload) {
                    warn!(event = event.name(), error = %e, "outbound event not framed");
                }
            }
            Err(e) => {
                warn!(event = event.name(), error = %e, "outbound event not encoded");
            }
        }
    }

    /// Drains completed inbound frames and posts the accepted ones, then
    /// notices a dead connection. Runs once per tick.
    fn service(&self) {
        let endpoint = self.endpoint.borrow().clone();
        let Some(endpoint) = endpoint else {
            return;
        };
        loop {
            let payload = endpoint.borrow_mut().try_take_incoming();
            let Some(payload) = payload else {
                break;
            };
            // One bad frame must never take down the stream.
            let wire = match self.codec.decode(&payload) {
                Ok(wire) => wire,
                Err(e) => {
                    warn!(error = %e, len = payload.len(), "dropping undecodable frame");
                    continue;
                }
            };
            if !(self.check_in_event)(&wire.name) {
                warn!(event = %wire.name, role = ?self.role, "refused inbound event");
                continue;
            }
            let WireEvent { name, fields } = wire;
            if let Some(id) = self.bus.post(&name, fields) {
                if self.role.outbound_events().contains(&name.as_str()) {
                    // Only echo-capable names need loop prevention; keeps
                    // the set from growing with ordinary inbound traffic.
                    self.posted.borrow_mut().insert(id);
                }
            }
        }
        if !endpoint.borrow().is_open() {
            self.release();
        }
    }

    /// Announces the disconnect locally (once) and lets go of the
    /// endpoint so both sides can be reclaimed.
    fn release(&self) {
        if self.endpoint.borrow_mut().take().is_none() {
            return;
        }
        if !self.disconnect_announced.replace(true) {
            debug!(role = ?self.role, "connection gone; announcing locally");
            self.bus.post(DISCONNECTED, Fields::new());
        }
    }
}

/// Connects an [`Endpoint`] to a [`Bus`] according to a [`Role`].
///
/// Construction registers the subscriptions; the adapter must then be
/// kept alive for as long as the bridge should exist, and *serviced*: its
/// tick subscription does the inbound work, so the owning loop only has
/// to keep polling the endpoint and draining the bus.
pub struct BusAdapter<S: ByteStream + 'static, C: Codec> {
    inner: Rc<AdapterInner<S, C>>,
    _outbound: Callback,
    _tick: Callback,
}

impl<S: ByteStream + 'static, C: Codec> BusAdapter<S, C> {
    /// Builds an adapter with the role's default inbound rule.
    pub fn new(bus: &Bus, endpoint: Rc<RefCell<Endpoint<S>>>, codec: C, role: Role) -> Self {
        Self::with_check(bus, endpoint, codec, role, move |name| {
            role.accepts_inbound(name)
        })
    }

    /// Builds an adapter with a custom inbound acceptance predicate.
    ///
    /// The predicate replaces the role rule entirely — access-control
    /// extension point for hosts that trust (or distrust) more than the
    /// default.
    pub fn with_check(
        bus: &Bus,
        endpoint: Rc<RefCell<Endpoint<S>>>,
        codec: C,
        role: Role,
        check_in_event: impl Fn(&str) -> bool + 'static,
    ) -> Self {
        let inner = Rc::new(AdapterInner {
            bus: bus.clone(),
            endpoint: RefCell::new(Some(endpoint)),
            codec,
            role,
            check_in_event: Box::new(check_in_event),
            posted: RefCell::new(HashSet::new()),
            disconnect_announced: Cell::new(false),
        });

        let outbound = {
            let inner = Rc::clone(&inner);
            Callback::closure(move |ev| {
                inner.forward(ev);
                Ok(())
            })
        };
        for name in role.outbound_events() {
            bus.connect(name, &outbound);
        }

        let tick = {
            let inner = Rc::clone(&inner);
            Callback::closure(move |_| {
                inner.service();
                Ok(())
            })
        };
        bus.connect(TICK, &tick);

        debug!(?role, "bus adapter attached");
        Self {
            inner,
            _outbound: outbound,
            _tick: tick,
        }
    }

    /// Whether the adapter still holds a live connection.
    pub fn is_connected(&self) -> bool {
        self.inner
            .endpoint
            .borrow()
            .as_ref()
            .is_some_and(|e| e.borrow().is_open())
    }

    /// Whether the adapter has let go of its endpoint (the connection is
    /// gone and the disconnect was announced). Detached adapters are safe
    /// to drop and reap.
    pub fn is_detached(&self) -> bool {
        self.inner.endpoint.borrow().is_none()
    }

    /// Closes the connection now. Buffered frames in both directions are
    /// discarded and the disconnect is announced locally.
    pub fn close(&self) {
        let endpoint = self.inner.endpoint.borrow().clone();
        if let Some(endpoint) = endpoint {
            endpoint.borrow_mut().close();
        }
        self.inner.release();
    }
}
