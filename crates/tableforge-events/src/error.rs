//! Error types for the event bus.

use crate::{CallbackKey, HandlerError};

/// Errors surfaced by [`Bus::drain`](crate::Bus::drain).
///
/// Only produced when the bus is configured to propagate handler failures
/// (`BusConfig::propagate_handler_errors`); the default policy logs the
/// failure and keeps the loop alive, so one misbehaving subscriber cannot
/// stall a whole domain.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A subscriber reported a failure while handling an event.
    #[error("handler {handler:?} for '{event}' failed: {reason}")]
    HandlerFailed {
        /// Name of the event being dispatched.
        event: String,
        /// Identity of the failing handler.
        handler: CallbackKey,
        /// The error the handler reported.
        reason: HandlerError,
    },
}
