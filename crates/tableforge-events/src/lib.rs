//! # Tableforge Events
//!
//! The publish/subscribe core of Tableforge. Game logic, network transport
//! and presentation never call each other directly: they post named events
//! onto a per-domain [`Bus`] and subscribe to the ones they care about.
//!
//! The dispatch model is tick-driven and fully synchronous:
//!
//! ```text
//! collaborators ── post ──▶ FIFO queue ── drain (per tick) ──▶ handlers
//! ```
//!
//! - [`Bus`] — registration, queuing, ordered dispatch ([`Bus::connect`],
//!   [`Bus::post`], [`Bus::drain`]).
//! - [`Callback`] — weakly-held subscriber handles; the bus never keeps a
//!   subscriber alive.
//! - [`Event`] / [`Value`] — the immutable named records that flow through.
//! - [`SubBus`] — a child bus grouping subscribers behind a parent.
//! - [`Pipe`] — mirrors a bus across a thread boundary with loop
//!   prevention.
//!
//! ## Example
//!
//! ```
//! use tableforge_events::{fields, Bus, Callback};
//!
//! let bus = Bus::new();
//! let cb = Callback::closure(|ev| {
//!     println!("pawn {} moved", ev.field("pawn").unwrap().as_int().unwrap());
//!     Ok(())
//! });
//! bus.connect("game-event-pawn-moved", &cb);
//! bus.post("game-event-pawn-moved", fields! { "pawn" => 7 });
//! let stopped = bus.drain()?;
//! assert!(!stopped);
//! # Ok::<(), tableforge_events::EventError>(())
//! ```

mod bus;
mod callback;
mod error;
mod event;
mod pipe;
mod sub;
mod value;

pub use bus::{Bus, BusConfig};
pub use callback::{Callback, CallbackKey, HandlerError};
pub use error::EventError;
pub use event::{DISCONNECTED, Event, EventId, QUIT, TICK};
pub use pipe::{Pipe, PipedEvent, channel_pair};
pub use sub::SubBus;
pub use value::{Fields, Value};
