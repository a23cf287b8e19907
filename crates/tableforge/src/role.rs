//! Which side of the wire a connection plays, and what it may say.
//!
//! The protocol is asymmetric: clients *request* changes, the server
//! *announces* them. Each role has a fixed set of event names it forwards
//! outbound; everything else stays domain-local. Inbound, each side
//! accepts exactly what the peer's role is allowed to send — with the one
//! extra rule that a server never trusts a client-originated full-state
//! update.

/// Event names a client forwards to the server.
pub const CLIENT_OUTBOUND: &[&str] = &[
    "game-request-pawn-move",
    "game-request-pawn-place",
    "game-request-pawn-next",
    "game-request-update",
];

/// Event names the server forwards to its clients.
pub const SERVER_OUTBOUND: &[&str] = &[
    "game-event-pawn-moved",
    "game-event-pawn-next",
    "game-event-update",
];

/// Which side of a connection a [`BusAdapter`](crate::BusAdapter) serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends requests, accepts announcements.
    Client,
    /// Sends announcements, accepts requests.
    Server,
}

impl Role {
    /// The event names this role forwards onto the wire.
    pub fn outbound_events(self) -> &'static [&'static str] {
        match self {
            Role::Client => CLIENT_OUTBOUND,
            Role::Server => SERVER_OUTBOUND,
        }
    }

    /// Default inbound acceptance rule: accept what the peer's role may
    /// send.
    ///
    /// A server additionally refuses `game-event-update` no matter what —
    /// full state flows server-to-client only, and a client that claims
    /// otherwise is buggy or hostile.
    pub fn accepts_inbound(self, name: &str) -> bool {
        match self {
            Role::Client => SERVER_OUTBOUND.contains(&name),
            Role::Server => name != "game-event-update" && CLIENT_OUTBOUND.contains(&name),
        }
    }
}
