//! Real-TCP smoke test: a server and a client on loopback, driven by
//! hand-rolled pump cycles instead of spinners so the test stays
//! deterministic and fast.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tableforge::{BoardClient, BoardServer};
use tableforge_events::{Bus, Callback, TICK, Value, fields};
use tableforge_protocol::JsonCodec;

#[test]
fn test_request_response_over_loopback_tcp() {
    let server_bus = Bus::new();
    let client_bus = Bus::new();

    let mut server = BoardServer::bind("127.0.0.1:0", server_bus.clone(), JsonCodec).unwrap();
    let addr = server.local_addr().unwrap();
    let mut client = BoardClient::join(addr, client_bus.clone(), JsonCodec).unwrap();
    assert!(client.is_connected());

    // Server-side game logic: answer update requests.
    let responder = {
        let server_bus = server_bus.clone();
        Callback::closure(move |_| {
            server_bus.post("game-event-update", fields! { "id" => 2048 });
            Ok(())
        })
    };
    server_bus.connect("game-request-update", &responder);

    // Client-side observer.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let observer = {
        let seen = Rc::clone(&seen);
        Callback::closure(move |ev| {
            seen.borrow_mut().push(ev.fields().clone());
            Ok(())
        })
    };
    client_bus.connect("game-event-update", &observer);

    client_bus.post("game-request-update", fields! {});

    // Bounded pump loop; exits as soon as the answer lands.
    for _ in 0..500 {
        server.pump().unwrap();
        client.pump().unwrap();
        server_bus.post(TICK, fields! {});
        server_bus.drain().unwrap();
        client_bus.post(TICK, fields! {});
        client_bus.drain().unwrap();
        if !seen.borrow().is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1, "update never arrived");
    assert_eq!(seen[0]["id"], Value::Int(2048));
    assert_eq!(server.peer_count(), 1);
}

#[test]
fn test_client_leaving_is_noticed_by_the_server() {
    let server_bus = Bus::new();
    let client_bus = Bus::new();

    let mut server = BoardServer::bind("127.0.0.1:0", server_bus.clone(), JsonCodec).unwrap();
    let addr = server.local_addr().unwrap();
    let client = BoardClient::join(addr, client_bus.clone(), JsonCodec).unwrap();

    // Let the accept happen.
    for _ in 0..500 {
        server.pump().unwrap();
        server_bus.post(TICK, fields! {});
        server_bus.drain().unwrap();
        if server.peer_count() == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(server.peer_count(), 1);

    client.leave();
    drop(client);

    for _ in 0..500 {
        server.pump().unwrap();
        server_bus.post(TICK, fields! {});
        server_bus.drain().unwrap();
        if server.peer_count() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(server.peer_count(), 0);
}
