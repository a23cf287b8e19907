//! Integration tests for bus registration, queuing and dispatch semantics.

use std::cell::RefCell;
use std::rc::Rc;

use tableforge_events::{
    Bus, BusConfig, Callback, EventError, HandlerError, QUIT, TICK, fields,
};

// =========================================================================
// Helpers
// =========================================================================

/// A callback that appends a label to a shared log on every invocation.
fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &str) -> Callback {
    let log = Rc::clone(log);
    let label = label.to_string();
    Callback::closure(move |_| {
        log.borrow_mut().push(label.clone());
        Ok(())
    })
}

fn shared_log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

// =========================================================================
// Posting and the no-subscriber drop rule
// =========================================================================

#[test]
fn test_unobserved_post_returns_none_and_queue_unchanged() {
    let bus = Bus::new();
    let before = bus.queue_len();
    assert!(bus.post("game-event-pawn-moved", fields! { "pawn" => 1 }).is_none());
    assert_eq!(bus.queue_len(), before);
}

#[test]
fn test_tick_with_no_subscribers_is_dropped_quietly() {
    let bus = Bus::new();
    assert!(bus.post(TICK, fields! { "dt" => 0.02 }).is_none());
    assert_eq!(bus.queue_len(), 0);
}

#[test]
fn test_quit_enqueued_with_zero_subscribers() {
    let bus = Bus::new();
    assert!(bus.post(QUIT, fields! {}).is_some());
    assert_eq!(bus.queue_len(), 1);
    assert!(bus.drain().unwrap());
}

#[test]
fn test_observed_posts_get_distinct_ids() {
    let bus = Bus::new();
    let log = shared_log();
    let cb = recorder(&log, "h");
    bus.connect("x", &cb);
    let a = bus.post("x", fields! {}).unwrap();
    let b = bus.post("x", fields! {}).unwrap();
    assert_ne!(a, b);
}

// =========================================================================
// Idempotent connect, disconnect modes
// =========================================================================

#[test]
fn test_connect_twice_invokes_once() {
    let bus = Bus::new();
    let log = shared_log();
    let cb = recorder(&log, "h");
    bus.connect("x", &cb);
    bus.connect("x", &cb);
    assert_eq!(bus.subscriber_count("x"), 1);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_connect_clone_is_same_subscription() {
    let bus = Bus::new();
    let log = shared_log();
    let cb = recorder(&log, "h");
    bus.connect("x", &cb);
    bus.connect("x", &cb.clone());
    assert_eq!(bus.subscriber_count("x"), 1);
}

#[test]
fn test_same_fn_item_connected_twice_invokes_once() {
    thread_local! {
        static CALLS: RefCell<u32> = const { RefCell::new(0) };
    }
    fn handler(_: &tableforge_events::Event) -> Result<(), HandlerError> {
        CALLS.with(|c| *c.borrow_mut() += 1);
        Ok(())
    }

    let bus = Bus::new();
    // Two independently-built handles around the same fn item.
    bus.connect("x", &Callback::function(handler));
    // The bus holds function handles strongly, so the temporaries above
    // staying unbound is fine.
    bus.connect("x", &Callback::function(handler));
    assert_eq!(bus.subscriber_count("x"), 1);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    CALLS.with(|c| assert_eq!(*c.borrow(), 1));
}

#[test]
fn test_disconnect_single_subscription() {
    let bus = Bus::new();
    let log = shared_log();
    let a = recorder(&log, "a");
    let b = recorder(&log, "b");
    bus.connect("x", &a);
    bus.connect("x", &b);

    bus.disconnect("x", &a);
    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(*log.borrow(), vec!["b".to_string()]);
}

#[test]
fn test_disconnect_event_removes_all_subscribers_for_name() {
    let bus = Bus::new();
    let log = shared_log();
    let a = recorder(&log, "a");
    let b = recorder(&log, "b");
    bus.connect("x", &a);
    bus.connect("x", &b);
    bus.connect("y", &a);

    bus.disconnect_event("x");
    assert_eq!(bus.subscriber_count("x"), 0);
    assert_eq!(bus.subscriber_count("y"), 1);
}

#[test]
fn test_disconnect_callback_removes_from_every_event() {
    let bus = Bus::new();
    let log = shared_log();
    let a = recorder(&log, "a");
    bus.connect("x", &a);
    bus.connect("y", &a);
    bus.connect_any(&a);

    bus.disconnect_callback(&a);
    assert!(!bus.has_subscribers("x"));
    assert!(!bus.has_subscribers("y"));
}

#[test]
fn test_clear_resets_everything() {
    let bus = Bus::new();
    let log = shared_log();
    let a = recorder(&log, "a");
    bus.connect("x", &a);
    bus.connect_any(&a);

    bus.clear();
    assert!(!bus.has_subscribers("x"));
    assert!(bus.post("x", fields! {}).is_none());
}

#[test]
fn test_disconnect_missing_subscription_is_noop() {
    let bus = Bus::new();
    let log = shared_log();
    let a = recorder(&log, "a");
    // Nothing registered; none of these should panic or error.
    bus.disconnect("x", &a);
    bus.disconnect_event("x");
    bus.disconnect_callback(&a);
}

// =========================================================================
// Ordering
// =========================================================================

#[test]
fn test_fifo_order_with_handler_reposting() {
    // post A, post B; A's handler posts C. Expected dispatch order:
    // A, B, C — C drains within the same call, behind B.
    let bus = Bus::new();
    let log = shared_log();

    let a_handler = {
        let log = Rc::clone(&log);
        let bus2 = bus.clone();
        Callback::closure(move |_| {
            log.borrow_mut().push("A".into());
            bus2.post("c", fields! {});
            Ok(())
        })
    };
    let b_handler = recorder(&log, "B");
    let c_handler = recorder(&log, "C");
    bus.connect("a", &a_handler);
    bus.connect("b", &b_handler);
    bus.connect("c", &c_handler);

    bus.post("a", fields! {});
    bus.post("b", fields! {});
    let stopped = bus.drain().unwrap();

    assert!(!stopped);
    assert_eq!(*log.borrow(), vec!["A".to_string(), "B".into(), "C".into()]);
    assert_eq!(bus.queue_len(), 0);
}

#[test]
fn test_handlers_fire_in_subscription_order() {
    let bus = Bus::new();
    let log = shared_log();
    let first = recorder(&log, "first");
    let second = recorder(&log, "second");
    let third = recorder(&log, "third");
    bus.connect("x", &first);
    bus.connect("x", &second);
    bus.connect("x", &third);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["first".to_string(), "second".into(), "third".into()]
    );
}

#[test]
fn test_named_handlers_fire_before_wildcard() {
    let bus = Bus::new();
    let log = shared_log();
    let any = recorder(&log, "any");
    let named = recorder(&log, "named");
    bus.connect_any(&any);
    bus.connect("x", &named);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(*log.borrow(), vec!["named".to_string(), "any".into()]);
}

#[test]
fn test_handler_on_both_named_and_wildcard_fires_once() {
    let bus = Bus::new();
    let log = shared_log();
    let cb = recorder(&log, "h");
    bus.connect("x", &cb);
    bus.connect_any(&cb);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(log.borrow().len(), 1);
}

// =========================================================================
// Weak subscriber lifetime
// =========================================================================

#[test]
fn test_live_receiver_method_invoked_via_dispatch() {
    struct Pawn {
        moves: RefCell<u32>,
    }
    fn on_move(pawn: &Pawn, _: &tableforge_events::Event) -> Result<(), HandlerError> {
        *pawn.moves.borrow_mut() += 1;
        Ok(())
    }

    let bus = Bus::new();
    let pawn = Rc::new(Pawn {
        moves: RefCell::new(0),
    });
    let cb = Callback::method(&pawn, on_move);
    bus.connect("game-event-pawn-moved", &cb);

    bus.post("game-event-pawn-moved", fields! {});
    bus.post("game-event-pawn-moved", fields! {});
    bus.drain().unwrap();

    assert_eq!(*pawn.moves.borrow(), 2);
}

#[test]
fn test_dead_receiver_not_invoked_and_purged() {
    struct Pawn {
        moves: RefCell<u32>,
    }
    fn on_move(pawn: &Pawn, _: &tableforge_events::Event) -> Result<(), HandlerError> {
        *pawn.moves.borrow_mut() += 1;
        Ok(())
    }

    let bus = Bus::new();
    let pawn = Rc::new(Pawn {
        moves: RefCell::new(0),
    });
    let cb = Callback::method(&pawn, on_move);
    bus.connect("game-event-pawn-moved", &cb);
    assert_eq!(bus.subscriber_count("game-event-pawn-moved"), 1);

    // Drop the only strong reference to the receiver. The Callback handle
    // is still around, but it holds the pawn weakly.
    drop(pawn);

    // Dead handle means no live subscriber: the post is dropped outright
    // and the stale entry is reclaimed.
    assert!(bus.post("game-event-pawn-moved", fields! {}).is_none());
    assert_eq!(bus.subscriber_count("game-event-pawn-moved"), 0);
    bus.drain().unwrap();
}

#[test]
fn test_dropped_closure_subscription_dies() {
    let bus = Bus::new();
    let log = shared_log();
    let keep = recorder(&log, "keep");
    let temp = recorder(&log, "temp");
    bus.connect("x", &keep);
    bus.connect("x", &temp);

    drop(temp);
    bus.post("x", fields! {});
    bus.drain().unwrap();

    assert_eq!(*log.borrow(), vec!["keep".to_string()]);
    assert_eq!(bus.subscriber_count("x"), 1);
}

// =========================================================================
// Quit
// =========================================================================

#[test]
fn test_quit_short_circuits_remaining_queue() {
    let bus = Bus::new();
    let log = shared_log();
    let x = recorder(&log, "X");
    let q = recorder(&log, "quit");
    let y = recorder(&log, "Y");
    bus.connect("x", &x);
    bus.connect(QUIT, &q);
    bus.connect("y", &y);

    bus.post("x", fields! {});
    bus.post(QUIT, fields! {});
    bus.post("y", fields! {});

    let stopped = bus.drain().unwrap();
    assert!(stopped);
    // Quit's own handlers ran, Y's never did.
    assert_eq!(*log.borrow(), vec!["X".to_string(), "quit".into()]);
    // Y is still queued; quit is a hard stop, not a flush.
    assert_eq!(bus.queue_len(), 1);
}

// =========================================================================
// Handler failure policy
// =========================================================================

fn failing() -> Callback {
    Callback::closure(|_| Err(HandlerError::from("handler broke")))
}

#[test]
fn test_default_policy_logs_and_continues() {
    let bus = Bus::new();
    let log = shared_log();
    let bad = failing();
    let good = recorder(&log, "good");
    bus.connect("x", &bad);
    bus.connect("x", &good);

    bus.post("x", fields! {});
    let stopped = bus.drain().unwrap();
    assert!(!stopped);
    // The failure did not stop the later handler.
    assert_eq!(*log.borrow(), vec!["good".to_string()]);
}

#[test]
fn test_propagate_policy_aborts_drain() {
    let bus = Bus::with_config(BusConfig {
        propagate_handler_errors: true,
    });
    let log = shared_log();
    let bad = failing();
    let good = recorder(&log, "good");
    bus.connect("x", &bad);
    bus.connect("x", &good);

    bus.post("x", fields! {});
    let err = bus.drain().unwrap_err();
    assert!(matches!(err, EventError::HandlerFailed { .. }));
    assert!(err.to_string().contains("handler broke"));
    assert!(log.borrow().is_empty());
}

// =========================================================================
// Reentrant registration
// =========================================================================

#[test]
fn test_handler_may_connect_and_disconnect_during_dispatch() {
    let bus = Bus::new();
    let log = shared_log();
    let late = recorder(&log, "late");

    let registrar = {
        let bus2 = bus.clone();
        let late2 = late.clone();
        Callback::closure(move |_| {
            // Connect a new subscriber and post again from inside dispatch.
            bus2.connect("followup", &late2);
            bus2.post("followup", fields! {});
            Ok(())
        })
    };
    bus.connect("x", &registrar);

    bus.post("x", fields! {});
    bus.drain().unwrap();
    assert_eq!(*log.borrow(), vec!["late".to_string()]);
}
