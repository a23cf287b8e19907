//! The event bus: subscription table, FIFO queue, tick-driven dispatch.
//!
//! One [`Bus`] per concurrency domain. Everything here is single-threaded
//! and synchronous by design: `post` only enqueues, and the external
//! driving loop empties the queue by calling [`Bus::drain`] once per tick.
//! The only suspension point in the whole core is socket I/O, which lives
//! in the transport crate — a stalled peer can never stall a domain's
//! dispatch.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::callback::{HandlerFn, WeakCallback};
use crate::{Callback, CallbackKey, Event, EventError, EventId, Fields, QUIT, TICK};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bus behavior knobs.
#[derive(Debug, Clone, Default)]
pub struct BusConfig {
    /// When `true`, the first handler failure aborts [`Bus::drain`] with an
    /// error ("crash on programmer error" parity with older revisions of
    /// this design). When `false` — the default — failures are logged and
    /// dispatch continues with the next handler.
    pub propagate_handler_errors: bool,
}

// ---------------------------------------------------------------------------
// Subscription table
// ---------------------------------------------------------------------------

/// One stored subscription. The vector it lives in is an order-preserving
/// set: dedup is by [`CallbackKey`], iteration is subscription order.
struct Entry {
    key: CallbackKey,
    weak: WeakCallback,
}

#[derive(Default)]
struct SubscriptionTable {
    named: HashMap<String, Vec<Entry>>,
    /// Wildcard subscribers: receive every event regardless of name.
    any: Vec<Entry>,
}

impl SubscriptionTable {
    fn insert(slot: &mut Vec<Entry>, cb: &Callback) {
        if slot.iter().any(|e| e.key == cb.key()) {
            return; // idempotent connect
        }
        slot.push(Entry {
            key: cb.key(),
            weak: cb.downgrade(),
        });
    }

    fn connect(&mut self, name: &str, cb: &Callback) {
        Self::insert(self.named.entry(name.to_string()).or_default(), cb);
    }

    fn connect_any(&mut self, cb: &Callback) {
        Self::insert(&mut self.any, cb);
    }

    fn disconnect(&mut self, name: &str, key: CallbackKey) {
        if let Some(slot) = self.named.get_mut(name) {
            slot.retain(|e| e.key != key);
            if slot.is_empty() {
                self.named.remove(name);
            }
        }
        // Silent no-op when the subscription never existed.
    }

    fn disconnect_event(&mut self, name: &str) {
        self.named.remove(name);
    }

    fn disconnect_callback(&mut self, key: CallbackKey) {
        self.named.retain(|_, slot| {
            slot.retain(|e| e.key != key);
            !slot.is_empty()
        });
        self.any.retain(|e| e.key != key);
    }

    fn clear(&mut self) {
        self.named.clear();
        self.any.clear();
    }

    /// Drops dead entries from a slot, returning the live thunks in
    /// subscription order.
    fn prune(slot: &mut Vec<Entry>) -> Vec<(CallbackKey, Rc<HandlerFn>)> {
        let mut live = Vec::with_capacity(slot.len());
        slot.retain(|e| match e.weak.resolve() {
            Some(thunk) => {
                live.push((e.key, thunk));
                true
            }
            None => {
                trace!(handler = ?e.key, "purged dead subscriber handle");
                false
            }
        });
        live
    }

    /// Live handlers for one event: named subscribers first (subscription
    /// order), then wildcard subscribers not already present by name.
    /// Purges dead handles as a side effect — the lazy GC pass.
    fn live_handlers(&mut self, name: &str) -> Vec<(CallbackKey, Rc<HandlerFn>)> {
        let mut handlers = self.prune_named(name);
        for (key, thunk) in Self::prune(&mut self.any) {
            if !handlers.iter().any(|(k, _)| *k == key) {
                handlers.push((key, thunk));
            }
        }
        handlers
    }

    /// Whether any live subscriber (named or wildcard) would observe the
    /// event. Purges dead handles it walks over.
    fn has_live(&mut self, name: &str) -> bool {
        !self.prune_named(name).is_empty() || !Self::prune(&mut self.any).is_empty()
    }

    fn live_count(&mut self, name: &str) -> usize {
        self.prune_named(name).len()
    }

    /// Prunes the slot for `name`, dropping the slot itself once empty so
    /// the table shrinks as subscribers die.
    fn prune_named(&mut self, name: &str) -> Vec<(CallbackKey, Rc<HandlerFn>)> {
        let mut live = Vec::new();
        let mut emptied = false;
        if let Some(slot) = self.named.get_mut(name) {
            live = Self::prune(slot);
            emptied = slot.is_empty();
        }
        if emptied {
            self.named.remove(name);
        }
        live
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

struct BusInner {
    subs: SubscriptionTable,
    queue: VecDeque<Event>,
    config: BusConfig,
}

/// The publish/subscribe dispatcher for one concurrency domain.
///
/// `Bus` is a cheap handle (`Rc` inside): clone it freely and pass clones
/// to every collaborator that posts or subscribes. It is deliberately *not*
/// `Send` — cross-domain communication goes through
/// [`Pipe`](crate::Pipe)s or network adapters, never through a shared
/// subscription table.
///
/// # Reserved events
///
/// - [`TICK`] drives draining and is exempt from drop logging.
/// - [`QUIT`] is always enqueued and makes [`Bus::drain`] stop early.
#[derive(Clone)]
pub struct Bus {
    inner: Rc<RefCell<BusInner>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates a bus with the default (log-and-continue) failure policy.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with an explicit configuration.
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                subs: SubscriptionTable::default(),
                queue: VecDeque::new(),
                config,
            })),
        }
    }

    // -- Registration -------------------------------------------------------

    /// Registers `callback` for events named `name`.
    ///
    /// Idempotent: connecting the same logical callback to the same event
    /// twice leaves exactly one active subscription. The bus holds the
    /// callback weakly — keep the `Callback` (or its receiver) alive for as
    /// long as the subscription should last.
    pub fn connect(&self, name: &str, callback: &Callback) {
        self.inner.borrow_mut().subs.connect(name, callback);
        trace!(event = name, handler = ?callback.key(), "connected subscriber");
    }

    /// Registers `callback` for *every* event, regardless of name.
    pub fn connect_any(&self, callback: &Callback) {
        self.inner.borrow_mut().subs.connect_any(callback);
        trace!(handler = ?callback.key(), "connected wildcard subscriber");
    }

    /// Removes one subscription. Removing a non-existent subscription is a
    /// silent no-op.
    pub fn disconnect(&self, name: &str, callback: &Callback) {
        self.inner.borrow_mut().subs.disconnect(name, callback.key());
    }

    /// Removes every subscription for `name`.
    pub fn disconnect_event(&self, name: &str) {
        self.inner.borrow_mut().subs.disconnect_event(name);
    }

    /// Removes `callback` from every event it was subscribed to, including
    /// the wildcard set.
    pub fn disconnect_callback(&self, callback: &Callback) {
        self.inner.borrow_mut().subs.disconnect_callback(callback.key());
    }

    /// Clears every subscription for every event. Full reset, used in
    /// teardown.
    pub fn clear(&self) {
        self.inner.borrow_mut().subs.clear();
    }

    // -- Posting ------------------------------------------------------------

    /// Constructs an event and appends it to the queue.
    ///
    /// Returns the freshly-minted transport id, or `None` when the event
    /// was dropped because nobody is listening. Unobserved chatter never
    /// accumulates in the queue; the one exception is [`QUIT`], which is
    /// always enqueued so a shutdown sequence cannot be silently swallowed.
    pub fn post(&self, name: &str, fields: Fields) -> Option<EventId> {
        let mut inner = self.inner.borrow_mut();
        if name != QUIT && !inner.subs.has_live(name) {
            if name != TICK {
                // Ticks with no subscribers are routine, not noise.
                trace!(event = name, "dropped event with no subscribers");
            }
            return None;
        }
        let id = EventId::next();
        inner.queue.push_back(Event::new(id, name, fields));
        if name != TICK {
            debug!(event = name, %id, "event queued");
        }
        Some(id)
    }

    // -- Dispatch -----------------------------------------------------------

    /// Synchronously dispatches every queued event.
    ///
    /// Runs until the queue is empty — events posted by handlers *during*
    /// the drain are processed in the same call, in FIFO order behind
    /// everything already queued. Within one event, named handlers fire in
    /// subscription order, then wildcard handlers. Dead handles encountered
    /// along the way are purged.
    ///
    /// Returns `Ok(true)` if a [`QUIT`] event was processed: its handlers
    /// run, then the drain stops immediately, leaving any later events
    /// queued. Quit is a hard stop, not a graceful flush.
    ///
    /// # Errors
    ///
    /// Only when `propagate_handler_errors` is set and a handler fails;
    /// otherwise failures are logged and dispatch continues.
    pub fn drain(&self) -> Result<bool, EventError> {
        loop {
            // Borrows are scoped so handlers can freely post, connect and
            // disconnect on this same bus while we dispatch.
            let event = match self.inner.borrow_mut().queue.pop_front() {
                Some(event) => event,
                None => return Ok(false),
            };
            let handlers = self.inner.borrow_mut().subs.live_handlers(event.name());
            let propagate = self.inner.borrow().config.propagate_handler_errors;

            for (key, thunk) in handlers {
                if let Err(reason) = thunk(&event) {
                    if propagate {
                        return Err(EventError::HandlerFailed {
                            event: event.name().to_string(),
                            handler: key,
                            reason,
                        });
                    }
                    error!(
                        event = event.name(),
                        handler = ?key,
                        error = %reason,
                        "event handler failed; continuing"
                    );
                }
            }

            if event.name() == QUIT {
                debug!("quit processed; stopping drain");
                return Ok(true);
            }
        }
    }

    // -- Introspection ------------------------------------------------------

    /// Number of live subscribers registered for `name` (wildcard
    /// subscribers not included). Purges dead handles as it counts.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner.borrow_mut().subs.live_count(name)
    }

    /// Whether a post of `name` would currently be observed.
    pub fn has_subscribers(&self, name: &str) -> bool {
        self.inner.borrow_mut().subs.has_live(name)
    }

    /// Number of events waiting in the queue.
    pub fn queue_len(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use std::cell::RefCell;

    #[test]
    fn test_post_without_subscribers_is_dropped() {
        let bus = Bus::new();
        assert!(bus.post("pawn-moved", fields! {}).is_none());
        assert_eq!(bus.queue_len(), 0);
    }

    #[test]
    fn test_quit_is_always_enqueued() {
        let bus = Bus::new();
        assert!(bus.post(QUIT, fields! {}).is_some());
        assert_eq!(bus.queue_len(), 1);
    }

    #[test]
    fn test_wildcard_subscriber_observes_everything() {
        let bus = Bus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let cb = {
            let seen = Rc::clone(&seen);
            Callback::closure(move |ev| {
                seen.borrow_mut().push(ev.name().to_string());
                Ok(())
            })
        };
        bus.connect_any(&cb);
        bus.post("a", fields! {});
        bus.post("b", fields! {});
        bus.drain().unwrap();
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_handler_sees_posted_fields() {
        let bus = Bus::new();
        let got = Rc::new(RefCell::new(None));
        let cb = {
            let got = Rc::clone(&got);
            Callback::closure(move |ev| {
                *got.borrow_mut() = ev.field("x").cloned();
                Ok(())
            })
        };
        bus.connect("probe", &cb);
        bus.post("probe", fields! { "x" => 9 });
        bus.drain().unwrap();
        assert_eq!(*got.borrow(), Some(crate::Value::Int(9)));
    }
}
