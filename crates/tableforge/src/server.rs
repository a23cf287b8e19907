//! The listening side: one acceptor, one adapter per connected player.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use tableforge_events::Bus;
use tableforge_protocol::Codec;
use tableforge_transport::{Acceptor, Endpoint, TcpByteStream};
use tracing::{info, warn};

use crate::{BusAdapter, Role, TableforgeError};

struct Peer<C: Codec> {
    endpoint: Rc<RefCell<Endpoint<TcpByteStream>>>,
    adapter: BusAdapter<TcpByteStream, C>,
}

/// Accepts players and bridges each one onto the shared server bus.
///
/// Everything a remote player sends arrives as ordinary bus events, and
/// every `game-event-*` the game logic posts fans out to all connected
/// players (each peer's adapter forwards it independently). Drive it by
/// calling [`pump`](Self::pump) from the spinner's pump closure.
pub struct BoardServer<C: Codec + Clone> {
    bus: Bus,
    acceptor: Acceptor,
    codec: C,
    peers: Vec<Peer<C>>,
}

impl<C: Codec + Clone> BoardServer<C> {
    /// Binds the listener and prepares to accept players.
    pub fn bind(
        addr: impl std::net::ToSocketAddrs,
        bus: Bus,
        codec: C,
    ) -> Result<Self, TableforgeError> {
        let acceptor = Acceptor::bind(addr)?;
        Ok(Self {
            bus,
            acceptor,
            codec,
            peers: Vec::new(),
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// One cycle of server upkeep: accept waiting players, poll every
    /// connection, reap the ones whose adapters have detached.
    ///
    /// Per-peer failures close that peer and are logged, never
    /// propagated — one player's broken socket must not take the table
    /// down.
    pub fn pump(&mut self) -> Result<(), TableforgeError> {
        loop {
            match self.acceptor.try_accept() {
                Ok(Some(endpoint)) => {
                    let endpoint = Rc::new(RefCell::new(endpoint));
                    let adapter = BusAdapter::new(
                        &self.bus,
                        Rc::clone(&endpoint),
                        self.codec.clone(),
                        Role::Server,
                    );
                    info!(peers = self.peers.len() + 1, "player joined");
                    self.peers.push(Peer { endpoint, adapter });
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "accept failed; will retry next cycle");
                    break;
                }
            }
        }

        for peer in &self.peers {
            if let Err(e) = peer.endpoint.borrow_mut().poll_once() {
                // poll_once already closed the endpoint; the adapter
                // announces the disconnect on the next tick.
                warn!(error = %e, "peer connection failed");
            }
        }

        let before = self.peers.len();
        self.peers.retain(|p| !p.adapter.is_detached());
        if self.peers.len() < before {
            info!(peers = self.peers.len(), "player left");
        }
        Ok(())
    }

    /// Number of currently tracked connections.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
