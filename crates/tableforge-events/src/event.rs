//! The event record and its reserved names.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Fields, Value};

/// Reserved event name: drives queue draining at the external loop's
/// cadence. Never forwarded across domains and never reported as "dropped,
/// no subscriber".
pub const TICK: &str = "tick";

/// Reserved event name: cooperative shutdown. Always enqueued, even with
/// zero subscribers, and short-circuits [`Bus::drain`](crate::Bus::drain).
pub const QUIT: &str = "quit";

/// Domain-local event posted by a network adapter when its endpoint closes,
/// so presentation collaborators can react to connection loss.
pub const DISCONNECTED: &str = "disconnected";

/// Process-wide counter behind [`EventId::next`]. Global (not per bus) so
/// ids stay unique across every domain in the process, which is what the
/// adapters' loop-prevention sets rely on.
static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque transport identity of a posted event.
///
/// Minted fresh by every [`Bus::post`](crate::Bus::post); adapters use it to
/// recognise events they themselves injected. It is transport metadata, not
/// domain data — it never appears in the serialized payload, and an event
/// that crosses a process boundary gets a new id on re-posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

impl EventId {
    pub(crate) fn next() -> Self {
        Self(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev-{}", self.0)
    }
}

/// An immutable named record: an event name plus an open set of fields.
///
/// Events have no behavior of their own; they are what flows through the
/// [`Bus`](crate::Bus) queue and out across endpoints. Handlers receive a
/// shared reference and read the fields they recognise.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    name: String,
    fields: Fields,
}

impl Event {
    pub(crate) fn new(id: EventId, name: impl Into<String>, fields: Fields) -> Self {
        Self {
            id,
            name: name.into(),
            fields,
        }
    }

    /// The transport id stamped at post time.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// The event name, e.g. `"game-request-pawn-move"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields of the event.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Looks up a single field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn test_event_ids_are_unique() {
        let a = EventId::next();
        let b = EventId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_lookup() {
        let ev = Event::new(EventId::next(), "pawn-moved", fields! { "x" => 4 });
        assert_eq!(ev.name(), "pawn-moved");
        assert_eq!(ev.field("x"), Some(&Value::Int(4)));
        assert_eq!(ev.field("y"), None);
    }
}
