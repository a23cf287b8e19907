//! The joining side: one connection, one adapter.

use std::cell::RefCell;
use std::net::ToSocketAddrs;
use std::rc::Rc;

use tableforge_events::Bus;
use tableforge_protocol::Codec;
use tableforge_transport::{Endpoint, TcpByteStream, TransportError};
use tracing::{info, warn};

use crate::{BusAdapter, Role, TableforgeError};

/// A player's connection to a board server.
///
/// Requests posted on the local bus (`game-request-*`) travel to the
/// server; its announcements (`game-event-*`) come back as local bus
/// events, plus a `disconnected` event if the connection drops. There is
/// no automatic reconnect — whoever initiated the join decides whether
/// to try again.
pub struct BoardClient<C: Codec> {
    endpoint: Rc<RefCell<Endpoint<TcpByteStream>>>,
    adapter: BusAdapter<TcpByteStream, C>,
}

impl<C: Codec> BoardClient<C> {
    /// Connects to a server and bridges the connection onto `bus`.
    ///
    /// The connect is the one blocking call; everything after it is
    /// non-blocking upkeep via [`pump`](Self::pump).
    pub fn join(addr: impl ToSocketAddrs, bus: Bus, codec: C) -> Result<Self, TableforgeError> {
        let stream = TcpByteStream::connect(addr)?;
        if let Ok(addr) = stream.peer_addr() {
            info!(%addr, "joined server");
        }
        let endpoint = Rc::new(RefCell::new(Endpoint::new(stream)));
        let adapter = BusAdapter::new(&bus, Rc::clone(&endpoint), codec, Role::Client);
        Ok(Self { endpoint, adapter })
    }

    /// One cycle of connection upkeep. Call from the spinner's pump
    /// closure.
    pub fn pump(&mut self) -> Result<(), TableforgeError> {
        if let Err(e) = self.endpoint.borrow_mut().poll_once() {
            match e {
                // The endpoint closed itself; the adapter announces the
                // disconnect on the next tick. Not fatal to the domain.
                TransportError::Io(_) | TransportError::Frame(_) => {
                    warn!(error = %e, "connection failed")
                }
                other => return Err(other.into()),
            }
        }
        Ok(())
    }

    /// Whether the connection is still live.
    pub fn is_connected(&self) -> bool {
        self.adapter.is_connected()
    }

    /// Hangs up. Undelivered frames in both directions are discarded and
    /// `disconnected` is posted locally.
    pub fn leave(&self) {
        self.adapter.close();
    }
}
