//! Room registry: creates rooms on demand, routes commands to them, and
//! fans disconnects out to every room a player belongs to.

use std::collections::HashMap;

use tracing::{debug, info};
use typespell_protocol::{PlayerId, RoomId, RoomSnapshot, SpellId};
use typespell_timer::TimerConfig;

use crate::room::{spawn_room, PlayerSender, RoomHandle};
use crate::RoomError;

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks all live rooms and which rooms each player is in.
///
/// Rooms are created implicitly by the first join to an unknown ID and
/// destroyed when the last member leaves. A player may be in several
/// rooms at once; their commands name the room they target, and a
/// disconnect is delivered to all of them.
pub struct RoomManager {
    rooms: HashMap<RoomId, RoomHandle>,
    /// Membership index, maintained on join and disconnect.
    player_rooms: HashMap<PlayerId, Vec<RoomId>>,
    timer_config: TimerConfig,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_timer_config(TimerConfig::default())
    }

    /// A manager whose rooms use the given intermission window.
    pub fn with_timer_config(timer_config: TimerConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            timer_config,
        }
    }

    /// Adds a player to a room, creating the room first if the ID is
    /// unknown. Joining a room the player is already in refreshes their
    /// outbound channel and is otherwise a no-op.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        username: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!(%room_id, "room created");
                spawn_room(
                    room_id.clone(),
                    self.timer_config.clone(),
                    DEFAULT_CHANNEL_SIZE,
                )
            })
            .clone();

        handle.join(player_id, username, sender).await?;

        let rooms = self.player_rooms.entry(player_id).or_default();
        if !rooms.contains(&room_id) {
            rooms.push(room_id);
        }
        Ok(())
    }

    /// Starts (or restarts) the game in a room.
    pub async fn start_game(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.handle(room_id)?.start_game().await
    }

    /// Records a player's round result in a room.
    pub async fn submit_result(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        duration: u64,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?
            .submit_result(player_id, duration)
            .await
    }

    /// Manually advances a room to its next round.
    pub async fn next_round(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.handle(room_id)?.next_round().await
    }

    /// Records a player's intermission spell choice in a room.
    pub async fn select_spell(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        spell_id: SpellId,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?
            .select_spell(player_id, spell_id)
            .await
    }

    /// Removes a disconnected player from every room they are in.
    /// Rooms that empty out are destroyed.
    pub async fn disconnect(&mut self, player_id: PlayerId) {
        let Some(room_ids) = self.player_rooms.remove(&player_id) else {
            debug!(%player_id, "disconnect for player with no rooms");
            return;
        };

        for room_id in room_ids {
            let Some(handle) = self.rooms.get(&room_id) else {
                continue;
            };
            match handle.disconnect(player_id).await {
                Ok(outcome) if outcome.room_empty => {
                    self.rooms.remove(&room_id);
                    info!(%room_id, "room destroyed");
                }
                Ok(_) => {}
                Err(err) => {
                    // The actor is already gone; drop the stale handle.
                    debug!(%room_id, %player_id, %err, "disconnect not delivered");
                    self.rooms.remove(&room_id);
                }
            }
        }
    }

    /// Returns the current snapshot of a room.
    pub async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id)?.snapshot().await
    }

    /// The rooms a player is currently in.
    pub fn rooms_of(&self, player_id: PlayerId) -> &[RoomId] {
        self.player_rooms
            .get(&player_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle(&self, room_id: &RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
