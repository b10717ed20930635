//! Spell identifiers and the static spell catalog.
//!
//! The server never interprets what a spell *does* to the race text —
//! that's the client's job. The only server-side meaning a spell id
//! carries is its classification: a buff lands on the caster, an
//! attack lands on the player ranked immediately ahead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Spell ids that apply to the caster. Anything else — including ids
/// this build has never heard of — is treated as an attack.
const BUFF_SPELLS: [&str; 2] = ["shield", "time_warp"];

/// An opaque spell identifier (e.g. `"gibberish"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellId(pub String);

impl SpellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for self-targeting spells, `false` for attacks.
    pub fn is_buff(&self) -> bool {
        BUFF_SPELLS.contains(&self.0.as_str())
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SpellId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The per-round map of target player → ordered spells applied to them,
/// computed once per intermission and delivered with the round start.
pub type ActiveSpells = BTreeMap<PlayerId, Vec<SpellId>>;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Whether a spell helps the caster or hinders their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellKind {
    Buff,
    Attack,
}

/// A catalog entry: display metadata clients show on the intermission
/// screen. Cooldowns are in milliseconds (all currently zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpellInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: SpellKind,
    pub cooldown: u32,
}

/// Every spell this server ships with.
pub const SPELLS: [SpellInfo; 5] = [
    SpellInfo {
        id: "symbol_storm",
        name: "Symbol Storm",
        description: "Injects 4 special characters into the opponent's text.",
        kind: SpellKind::Attack,
        cooldown: 0,
    },
    SpellInfo {
        id: "gibberish",
        name: "Void Babble",
        description: "Inserts a random 6-letter gibberish word into the text.",
        kind: SpellKind::Attack,
        cooldown: 0,
    },
    SpellInfo {
        id: "heavy_freeze",
        name: "Brain Freeze",
        description: "Raises the opponent's freeze penalty to 1.5 seconds for the round.",
        kind: SpellKind::Attack,
        cooldown: 0,
    },
    SpellInfo {
        id: "shield",
        name: "Shield",
        description: "Absorbs the next attack spell that lands on you.",
        kind: SpellKind::Buff,
        cooldown: 0,
    },
    SpellInfo {
        id: "time_warp",
        name: "Time Warp",
        description: "Shaves a time bonus off your next round's duration.",
        kind: SpellKind::Buff,
        cooldown: 0,
    },
];
