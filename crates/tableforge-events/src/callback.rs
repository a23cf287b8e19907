//! Weakly-held subscriber callbacks.
//!
//! The bus must never extend the lifetime of a subscriber: once the owning
//! side of a callback is gone, the subscription silently dies and the bus
//! purges the stale entry on the next dispatch. Three flavors cover the
//! ways collaborators subscribe:
//!
//! - [`Callback::function`] — a plain `fn` item. There is nothing to keep
//!   alive, so these handles always resolve, and the same `fn` connected
//!   twice deduplicates by function-pointer identity.
//! - [`Callback::closure`] — an owned closure. The returned `Callback` *is*
//!   the owning handle; the bus keeps only a weak reference, so dropping
//!   the `Callback` ends the subscription. This is the explicit
//!   release-before-drop contract that replaces garbage-collected weak
//!   method references.
//! - [`Callback::method`] — a method on a shared receiver. The handle holds
//!   the receiver weakly and the method strongly; it stops resolving the
//!   moment the receiver's last `Rc` drops, with no unsubscribe call
//!   needed.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::Event;

/// Error type a handler may report; the bus's failure policy decides
/// whether it propagates out of `drain` or is logged and skipped.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The uniform handler signature. Handlers receive the whole event and
/// destructure only the fields they use.
pub type HandlerFn = dyn Fn(&Event) -> Result<(), HandlerError>;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Canonical identity of a callback, used for dedup and targeted
/// disconnects.
///
/// Two handles wrapping the same logical callback compare equal: same `fn`
/// item, same closure allocation, or same `(receiver, method)` pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKey {
    /// Address of a plain `fn` item.
    Function(usize),
    /// Allocation address of an owned closure.
    Closure(usize),
    /// `(receiver address, method address)` of a bound method.
    Method(usize, usize),
}

impl fmt::Debug for CallbackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackKey::Function(p) => write!(f, "fn@{p:#x}"),
            CallbackKey::Closure(p) => write!(f, "closure@{p:#x}"),
            CallbackKey::Method(r, m) => write!(f, "method@{r:#x}/{m:#x}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Strong handle
// ---------------------------------------------------------------------------

enum CallbackKind {
    /// Plain functions are `'static`; the thunk is held strongly and the
    /// handle never dies.
    Function(Rc<HandlerFn>),
    /// The caller owns the only strong reference via the `Callback` itself.
    Closure(Rc<HandlerFn>),
    /// Receiver held weakly; the thunk re-derives it at call time.
    Method {
        receiver: Weak<dyn Any>,
        thunk: Rc<HandlerFn>,
    },
}

/// A subscriber callback, ready to hand to
/// [`Bus::connect`](crate::Bus::connect).
///
/// Cloning a `Callback` preserves its identity — a clone connected to the
/// same event is a no-op, not a second subscription.
pub struct Callback {
    key: CallbackKey,
    kind: CallbackKind,
}

impl Callback {
    /// Wraps a plain function. Always live; deduplicated by the function's
    /// own identity.
    pub fn function(f: fn(&Event) -> Result<(), HandlerError>) -> Self {
        Self {
            key: CallbackKey::Function(f as usize),
            kind: CallbackKind::Function(Rc::new(f)),
        }
    }

    /// Wraps an owned closure. The subscription lives exactly as long as
    /// the returned `Callback` (or a clone of it) does.
    pub fn closure(f: impl Fn(&Event) -> Result<(), HandlerError> + 'static) -> Self {
        let thunk: Rc<HandlerFn> = Rc::new(f);
        Self {
            key: CallbackKey::Closure(Rc::as_ptr(&thunk) as *const () as usize),
            kind: CallbackKind::Closure(thunk),
        }
    }

    /// Wraps a method bound to a shared receiver.
    ///
    /// Holds `receiver` weakly: when the last strong `Rc` to it drops, the
    /// handle resolves to nothing and the bus reclaims the subscription
    /// lazily. Interior mutability is the receiver's business — use
    /// `Rc<RefCell<T>>` and borrow inside the method if it mutates.
    pub fn method<T: 'static>(
        receiver: &Rc<T>,
        f: fn(&T, &Event) -> Result<(), HandlerError>,
    ) -> Self {
        let key = CallbackKey::Method(Rc::as_ptr(receiver) as *const () as usize, f as usize);
        let weak = Rc::downgrade(receiver);
        let receiver: Weak<dyn Any> = weak.clone();
        let thunk: Rc<HandlerFn> = Rc::new(move |event: &Event| match weak.upgrade() {
            Some(obj) => f(&obj, event),
            // Receiver died between resolution and invocation; nothing to do.
            None => Ok(()),
        });
        Self {
            key,
            kind: CallbackKind::Method { receiver, thunk },
        }
    }

    /// This callback's canonical identity.
    pub fn key(&self) -> CallbackKey {
        self.key
    }

    /// Creates the weak handle the bus stores.
    pub(crate) fn downgrade(&self) -> WeakCallback {
        let kind = match &self.kind {
            CallbackKind::Function(thunk) => WeakKind::Function(Rc::clone(thunk)),
            CallbackKind::Closure(thunk) => WeakKind::Closure(Rc::downgrade(thunk)),
            CallbackKind::Method { receiver, thunk } => WeakKind::Method {
                receiver: receiver.clone(),
                thunk: Rc::clone(thunk),
            },
        };
        WeakCallback { kind }
    }
}

impl Clone for Callback {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            CallbackKind::Function(t) => CallbackKind::Function(Rc::clone(t)),
            CallbackKind::Closure(t) => CallbackKind::Closure(Rc::clone(t)),
            CallbackKind::Method { receiver, thunk } => CallbackKind::Method {
                receiver: receiver.clone(),
                thunk: Rc::clone(thunk),
            },
        };
        Self {
            key: self.key,
            kind,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:?})", self.key)
    }
}

// ---------------------------------------------------------------------------
// Weak handle
// ---------------------------------------------------------------------------

enum WeakKind {
    Function(Rc<HandlerFn>),
    Closure(Weak<HandlerFn>),
    Method {
        receiver: Weak<dyn Any>,
        thunk: Rc<HandlerFn>,
    },
}

/// What the subscription table actually stores. Identity lives beside it
/// in the table entry; the weak handle only knows how to resolve.
pub(crate) struct WeakCallback {
    kind: WeakKind,
}

impl WeakCallback {
    /// Re-derives the live callable, or `None` if the owning side is gone.
    pub(crate) fn resolve(&self) -> Option<Rc<HandlerFn>> {
        match &self.kind {
            WeakKind::Function(thunk) => Some(Rc::clone(thunk)),
            WeakKind::Closure(weak) => weak.upgrade(),
            WeakKind::Method { receiver, thunk } => {
                receiver.upgrade().map(|_| Rc::clone(thunk))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventId, Fields};
    use std::cell::Cell;

    fn event(name: &str) -> Event {
        Event::new(EventId::next(), name, Fields::new())
    }

    fn noop(_: &Event) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn test_function_handles_share_identity() {
        let a = Callback::function(noop);
        let b = Callback::function(noop);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_function_handle_always_resolves() {
        let cb = Callback::function(noop);
        let weak = cb.downgrade();
        drop(cb);
        assert!(weak.resolve().is_some());
    }

    #[test]
    fn test_closures_have_distinct_identity() {
        let a = Callback::closure(|_| Ok(()));
        let b = Callback::closure(|_| Ok(()));
        assert_ne!(a.key(), b.key());
        // But a clone is the same subscription.
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn test_closure_handle_dies_with_owner() {
        let cb = Callback::closure(|_| Ok(()));
        let weak = cb.downgrade();
        assert!(weak.resolve().is_some());
        drop(cb);
        assert!(weak.resolve().is_none());
    }

    #[test]
    fn test_method_handle_dies_with_receiver() {
        let receiver = Rc::new(Cell::new(0));
        let cb = Callback::method(&receiver, |cell: &Cell<i32>, _| {
            cell.set(cell.get() + 1);
            Ok(())
        });
        let weak = cb.downgrade();

        let thunk = weak.resolve().expect("receiver alive");
        thunk(&event("x")).unwrap();
        assert_eq!(receiver.get(), 1);

        drop(receiver);
        // The Callback itself is still around, but the receiver is not.
        assert!(weak.resolve().is_none());
    }

    #[test]
    fn test_same_receiver_and_method_share_identity() {
        let receiver = Rc::new(Cell::new(0));
        let handler = |cell: &Cell<i32>, _: &Event| -> Result<(), HandlerError> {
            cell.set(1);
            Ok(())
        };
        let a = Callback::method(&receiver, handler);
        let b = Callback::method(&receiver, handler);
        assert_eq!(a.key(), b.key());

        let other = Rc::new(Cell::new(0));
        let c = Callback::method(&other, handler);
        assert_ne!(a.key(), c.key());
    }
}
