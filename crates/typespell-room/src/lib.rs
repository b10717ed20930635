//! Room orchestration for Typespell.
//!
//! Each room is an actor: a Tokio task that owns the race state and an
//! intermission timer, fed commands over an mpsc channel. The
//! [`RoomManager`] is the registry in front of the actors — it creates
//! rooms on first join, routes commands by room ID, and destroys rooms
//! when the last player leaves.
//!
//! The pure pieces live in their own modules so they can be tested
//! without a runtime: [`rank_players`] orders players by duration, and
//! [`resolve_spells`] turns intermission selections into the next
//! round's active-spell map.

mod error;
mod manager;
mod ranking;
mod room;
mod spells;
mod state;

pub use error::RoomError;
pub use manager::RoomManager;
pub use ranking::{rank_players, RankKey};
pub use room::{DisconnectOutcome, PlayerSender, RoomHandle};
pub use spells::resolve_spells;
pub use state::{Player, Room, ROUNDS_PER_GAME};
