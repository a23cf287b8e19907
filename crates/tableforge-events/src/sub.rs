//! Nested buses: isolating a group of subscribers behind a child bus.
//!
//! A [`SubBus`] composes a child [`Bus`] with subscriptions into a parent
//! bus (it is *not* both at once — composition over inheritance). Events
//! posted through the sub-bus travel up to the parent; everything the
//! parent dispatches is mirrored down into the child queue, where the
//! child's own subscribers see it on the next local drain. This keeps a
//! subsystem's handlers (say, the presentation layer) pluggable: drop the
//! `SubBus` and the whole group detaches at once.

use tracing::trace;

use crate::{Bus, Callback, Fields, TICK};

/// A child bus wired into a parent bus.
///
/// Tick flow depends on `independent`:
///
/// - Dependent (`independent == false`): the parent's tick is mirrored into
///   the child and the child queue is drained inside the parent's dispatch,
///   so the owner has nothing to drive.
/// - Independent: the child is driven by its own external loop; the
///   parent's ticks are filtered out at the boundary, because forwarding a
///   tick would double-drain the child.
///
/// One deliberate asymmetry: a `quit` is mirrored down like any other
/// event, but in the dependent case it lands *after* the parent's drain
/// has already stopped, so it sits in the child queue undispatched. That
/// is fine — the whole domain is shutting down and the child's driving
/// cadence dies with the parent — but a dependent child's `quit`
/// subscribers should not be relied on for cleanup work.
pub struct SubBus {
    parent: Bus,
    local: Bus,
    // Keeps the parent-side subscription alive for as long as the SubBus.
    _downlink: Callback,
}

impl SubBus {
    /// Attaches a new child bus to `parent`.
    pub fn new(parent: &Bus, independent: bool) -> Self {
        let local = Bus::new();
        let downlink = {
            let local = local.clone();
            Callback::closure(move |ev| {
                if ev.name() == TICK {
                    if !independent {
                        // Drive the child inline with the parent's cadence.
                        local.post(TICK, ev.fields().clone());
                        local.drain()?;
                    }
                    return Ok(());
                }
                // Mirror downward; the child's own drop rule filters
                // events no local subscriber wants.
                local.post(ev.name(), ev.fields().clone());
                Ok(())
            })
        };
        parent.connect_any(&downlink);
        trace!(independent, "sub-bus attached to parent");
        Self {
            parent: parent.clone(),
            local,
            _downlink: downlink,
        }
    }

    /// The child bus. Subscribers belonging to this group connect here.
    pub fn bus(&self) -> &Bus {
        &self.local
    }

    /// Posts an event visible to the whole process: it goes up to the
    /// parent and is mirrored back down into every attached child,
    /// including this one.
    pub fn post(&self, name: &str, fields: Fields) {
        if name == TICK {
            // Ticks are cadence, not data; they stay local.
            self.local.post(name, fields);
            return;
        }
        self.parent.post(name, fields);
    }
}
