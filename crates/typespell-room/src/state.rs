//! In-memory room and player state owned by a room actor.

use typespell_protocol::{
    PlayerId, PlayerSnapshot, RoomId, RoomSnapshot, RoomStatus, SpellId,
};

/// The game runs exactly this many rounds.
pub const ROUNDS_PER_GAME: u8 = 3;

/// One player's authoritative state inside a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    /// Unix-epoch ms when this round's result arrived. `None` = still racing.
    pub finish_time: Option<u64>,
    /// This round's elapsed ms.
    pub round_duration: Option<u64>,
    /// Cumulative ms across all rounds of the current game.
    pub total_duration: u64,
    /// Intermission spell choice, cleared at resolution.
    pub selected_spell: Option<SpellId>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, is_host: bool) -> Self {
        Self {
            id,
            name,
            is_host,
            finish_time: None,
            round_duration: None,
            total_duration: 0,
            selected_spell: None,
        }
    }

    pub fn has_finished(&self) -> bool {
        self.finish_time.is_some()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            is_host: self.is_host,
            finish_time: self.finish_time,
            round_duration: self.round_duration,
            total_duration: self.total_duration,
            selected_spell: self.selected_spell.clone(),
        }
    }
}

/// Authoritative room state. Only the owning actor touches this.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    /// Join order; position 0 inherits the host role on migration.
    pub players: Vec<Player>,
    pub status: RoomStatus,
    pub round: u8,
    /// Round-epoch counter. Bumped on every transition into `Racing`
    /// or `Victory`; the intermission timer stamps deadlines with it
    /// so stale fires can be told apart from fresh ones.
    pub epoch: u64,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            players: Vec::new(),
            status: RoomStatus::Lobby,
            round: 1,
            epoch: 0,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Adds a player if not already present. The first joiner becomes
    /// host; absent or empty names default to `Player N`.
    pub fn add_player(&mut self, id: PlayerId, username: Option<String>) {
        if self.contains(id) {
            return;
        }
        let name = match username {
            Some(name) if !name.is_empty() => name,
            _ => format!("Player {}", self.players.len() + 1),
        };
        let is_host = self.players.is_empty();
        self.players.push(Player::new(id, name, is_host));
    }

    /// Removes and returns a player, preserving the order of the rest.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    pub fn all_finished(&self) -> bool {
        self.players.iter().all(Player::has_finished)
    }

    /// Full reset for a fresh game: everyone back to zero.
    pub fn reset_for_new_game(&mut self) {
        for p in &mut self.players {
            p.finish_time = None;
            p.round_duration = None;
            p.total_duration = 0;
        }
    }

    /// Per-round reset at the timer-driven advance. Selections are
    /// cleared here as a backstop; resolution normally already took
    /// them.
    pub fn reset_for_next_round(&mut self) {
        for p in &mut self.players {
            p.finish_time = None;
            p.round_duration = None;
            p.selected_spell = None;
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            players: self.players.iter().map(Player::snapshot).collect(),
            status: self.status,
            round: self.round,
        }
    }
}
