//! WebSocket transport for Typespell.
//!
//! A deliberately thin layer: [`WsListener`] accepts and upgrades
//! connections (minting each one a [`typespell_protocol::PlayerId`]),
//! and [`WsConnection`] moves JSON text frames in both directions.
//! Everything above this crate deals in decoded commands and events.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener};
