//! A complete miniature session: a board server and one player, each in
//! their own thread with their own bus and spinner, talking over loopback
//! TCP. The player asks to move a pawn, the server applies the move and
//! announces it, the player sees the announcement and leaves.
//!
//! Run with `RUST_LOG=debug` to watch every event cross the wire.

use std::net::SocketAddr;
use std::sync::mpsc;

use tableforge::prelude::*;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();

    let server_thread = std::thread::spawn(move || run_server(addr_tx));
    let addr = addr_rx.recv()?;
    run_player(addr)?;

    server_thread
        .join()
        .map_err(|_| "server thread panicked")??;
    Ok(())
}

/// The game-master domain: owns the board state, answers requests.
fn run_server(addr_tx: mpsc::Sender<SocketAddr>) -> Result<(), TableforgeError> {
    let bus = Bus::new();
    let mut server = BoardServer::bind("127.0.0.1:0", bus.clone(), JsonCodec)?;
    if let Ok(addr) = server.local_addr() {
        let _ = addr_tx.send(addr);
    }

    // Board logic: accept any move request and announce the result.
    let on_move = {
        let bus = bus.clone();
        Callback::closure(move |ev| {
            info!(fields = ?ev.fields(), "applying pawn move");
            let mut fields = ev.fields().clone();
            fields.insert("applied".into(), true.into());
            bus.post("game-event-pawn-moved", fields);
            Ok(())
        })
    };
    bus.connect("game-request-pawn-move", &on_move);

    // A one-player demo: when the player leaves, shut down.
    let on_leave = {
        let bus = bus.clone();
        Callback::closure(move |_| {
            info!("player left; shutting down");
            bus.post(QUIT, fields! {});
            Ok(())
        })
    };
    bus.connect(DISCONNECTED, &on_leave);

    Spinner::new(bus, SpinnerConfig::default()).run(|| server.pump())
}

/// The player domain: sends one move, waits for the announcement.
fn run_player(addr: SocketAddr) -> Result<(), TableforgeError> {
    let bus = Bus::new();
    let mut client = BoardClient::join(addr, bus.clone(), JsonCodec)?;

    let on_moved = {
        let bus = bus.clone();
        Callback::closure(move |ev| {
            info!(fields = ?ev.fields(), "pawn moved on the board");
            bus.post(QUIT, fields! {});
            Ok(())
        })
    };
    bus.connect("game-event-pawn-moved", &on_moved);

    bus.post(
        "game-request-pawn-move",
        fields! { "pawn" => 7, "x" => 4, "y" => 2 },
    );

    let result = Spinner::new(bus, SpinnerConfig::default()).run(|| client.pump());
    client.leave();
    result
}
