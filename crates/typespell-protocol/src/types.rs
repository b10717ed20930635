//! Core wire types: identities, room snapshots, commands, and events.
//!
//! Everything in this module travels between client and server as JSON.
//! Commands and events are internally tagged (`"type"` field) with
//! snake_case tags, and payload fields use camelCase — the shapes the
//! browser client already speaks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spell::{ActiveSpells, SpellId};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a live connection, which doubles as the
/// player's identity — there is no separate account layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room identifier. Opaque and externally supplied: whatever string
/// the first joiner names becomes the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Room status
// ---------------------------------------------------------------------------

/// The lifecycle status of a room.
///
/// ```text
/// lobby → racing → scoreboard → racing → … → victory
/// ```
///
/// `victory` is also reachable directly from `racing` when attrition
/// leaves a single player standing. There is deliberately no room-wide
/// "waiting" status: while stragglers type, the room stays `racing`
/// and each client infers its own wait state from its own finish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Lobby,
    Racing,
    Scoreboard,
    Victory,
}

impl RoomStatus {
    /// Returns `true` once a game is underway (anything past the lobby).
    pub fn is_in_game(&self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Racing => write!(f, "racing"),
            Self::Scoreboard => write!(f, "scoreboard"),
            Self::Victory => write!(f, "victory"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A player as seen on the wire, inside `room_update` and rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// Unix-epoch milliseconds of this round's submission; `None` means
    /// the player is still racing.
    pub finish_time: Option<u64>,
    /// This round's elapsed milliseconds.
    pub round_duration: Option<u64>,
    /// Cumulative milliseconds across the rounds played so far.
    pub total_duration: u64,
    /// Intermission choice, visible to everyone until resolution.
    pub selected_spell: Option<SpellId>,
}

/// The full room state broadcast after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    /// Join order. Position 0 inherits the host role on migration.
    pub players: Vec<PlayerSnapshot>,
    pub status: RoomStatus,
    pub round: u8,
}

// ---------------------------------------------------------------------------
// Commands (client → server)
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do. The sender's identity
/// is implicit — it is the connection the command arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Create the room if it doesn't exist, then join it.
    JoinRoom {
        room_id: RoomId,
        username: Option<String>,
    },

    /// Reset everyone's times and enter round 1.
    StartGame { room_id: RoomId },

    /// Report this round's elapsed time in milliseconds.
    SubmitResult { room_id: RoomId, duration: u64 },

    /// Manually advance to the next round (skips spell resolution).
    NextRound { room_id: RoomId },

    /// Record an intermission spell choice.
    SelectSpell { room_id: RoomId, spell_id: SpellId },

    /// Fire a spell directly at another connection, mid-round.
    CastSpell {
        room_id: RoomId,
        target_id: PlayerId,
        spell_id: SpellId,
    },
}

// ---------------------------------------------------------------------------
// Events (server → client)
// ---------------------------------------------------------------------------

/// Everything the server can tell a client. Broadcast room-wide except
/// for `ReceiveSpell`, which goes to the target connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full room snapshot, sent after every mutation.
    RoomUpdate { room: RoomSnapshot },

    /// A round is starting. `active_spells` is present on the
    /// timer-driven advance (after spell resolution) and absent on
    /// game start and manual advance.
    GlobalStartRound {
        round: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        active_spells: Option<ActiveSpells>,
    },

    /// An intermediate round (1 or 2) completed; scoreboard time.
    RoundFinished { rankings: Vec<PlayerSnapshot> },

    /// The final round completed, or a last-player-standing victory.
    GameOver { rankings: Vec<PlayerSnapshot> },

    /// A spell cast directly at this connection.
    ReceiveSpell {
        spell_id: SpellId,
        caster_id: PlayerId,
    },
}

// =========================================================================
// Tests
// =========================================================================
