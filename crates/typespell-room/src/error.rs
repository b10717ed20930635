//! Error types for the room layer.
//!
//! The protocol is fire-and-forget: the gateway absorbs these as
//! logged no-ops rather than surfacing anything to the sender. They
//! exist so callers *can* tell the cases apart.

use typespell_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's actor is gone or its inbox is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
