//! Wire protocol for Typespell.
//!
//! Defines the language clients and the server speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`RoomSnapshot`],
//!   identity newtypes) — the structures that travel on the wire.
//! - **Spells** ([`SpellId`], the [`SPELLS`] catalog) — identifiers and
//!   the buff/attack classification.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how frames are converted
//!   to/from text.
//! - **Errors** ([`ProtocolError`]).
//!
//! This crate knows nothing about connections, rooms, or timing — it
//! only describes messages.

mod codec;
mod error;
mod spell;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use spell::{ActiveSpells, SPELLS, SpellId, SpellInfo, SpellKind};
pub use types::{
    ClientCommand, PlayerId, PlayerSnapshot, RoomId, RoomSnapshot, RoomStatus,
    ServerEvent,
};
