//! # Tableforge
//!
//! Event-driven core for a networked tabletop board tracker.
//!
//! Everything in a Tableforge process — local input, game logic, remote
//! players — communicates through one [`Bus`](tableforge_events::Bus) per
//! concurrency domain. This facade crate wires the dispatch core to the
//! framed transport and re-exports the working set:
//!
//! - [`BusAdapter`] bridges one connection onto one bus, by [`Role`].
//! - [`BoardServer`] / [`BoardClient`] are the TCP glue on top of it.
//! - [`Spinner`] drives a domain: tick, pump, drain, sleep.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tableforge::prelude::*;
//!
//! fn main() -> Result<(), TableforgeError> {
//!     let bus = Bus::new();
//!     let mut client = BoardClient::join("127.0.0.1:7777", bus.clone(), JsonCodec)?;
//!
//!     let on_update = Callback::closure(|ev| {
//!         println!("board state: {:?}", ev.fields());
//!         Ok(())
//!     });
//!     bus.connect("game-event-update", &on_update);
//!     bus.post("game-request-update", fields! {});
//!
//!     Spinner::new(bus, SpinnerConfig::default()).run(|| client.pump())
//! }
//! ```

mod adapter;
mod client;
mod error;
mod role;
mod server;
mod spinner;

pub use adapter::BusAdapter;
pub use client::BoardClient;
pub use error::TableforgeError;
pub use role::{CLIENT_OUTBOUND, Role, SERVER_OUTBOUND};
pub use server::BoardServer;
pub use spinner::{Spinner, SpinnerConfig, SpinnerHalt};

/// The working set, one `use` away.
pub mod prelude {
    pub use crate::{
        BoardClient, BoardServer, BusAdapter, Role, Spinner, SpinnerConfig, TableforgeError,
    };
    pub use tableforge_events::{
        Bus, BusConfig, Callback, DISCONNECTED, Event, Fields, Pipe, QUIT, SubBus, TICK, Value,
        fields,
    };
    pub use tableforge_protocol::{Codec, JsonCodec, WireEvent};
    pub use tableforge_transport::{Acceptor, Endpoint, TcpByteStream, memory_pair};
}
