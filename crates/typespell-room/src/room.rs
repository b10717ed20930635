//! Room actor: an isolated Tokio task that owns one race.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor owns the `Room` state and the
//! intermission timer, so commands and timer fires are processed one at
//! a time — there is no moment where a submit and a timer expiry touch
//! the state concurrently.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use typespell_protocol::{
    PlayerId, RoomId, RoomSnapshot, RoomStatus, ServerEvent, SpellId,
};
use typespell_timer::{IntermissionTimer, TimerConfig};

use crate::ranking::{rank_players, RankKey};
use crate::spells::resolve_spells;
use crate::state::{Room, ROUNDS_PER_GAME};
use crate::RoomError;

/// Channel sender for delivering server events to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the
/// caller sends a command and waits for the response on it. Gameplay
/// commands are fire-and-forget: the outcome reaches clients as
/// broadcast events, not as replies.
pub(crate) enum RoomCommand {
    /// Add a player (idempotent) and register their outbound channel.
    Join {
        player_id: PlayerId,
        username: Option<String>,
        sender: PlayerSender,
        reply: oneshot::Sender<()>,
    },

    /// Start (or restart) the game from any state.
    StartGame,

    /// Record a player's round result.
    SubmitResult { player_id: PlayerId, duration: u64 },

    /// Manually advance to the next round.
    NextRound,

    /// Record a player's intermission spell choice.
    SelectSpell {
        player_id: PlayerId,
        spell_id: SpellId,
    },

    /// Remove a disconnected player and run the departure rules.
    Disconnect {
        player_id: PlayerId,
        reply: oneshot::Sender<DisconnectOutcome>,
    },

    /// Request the current room snapshot.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// What a disconnect did to the room, so the manager can update its
/// index and drop the handle when the room emptied out.
#[derive(Debug, Clone, Copy)]
pub struct DisconnectOutcome {
    /// Whether the player was actually a member.
    pub removed: bool,
    /// Whether the room is now empty (the actor has stopped).
    pub room_empty: bool,
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper. The `RoomManager` holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's ID.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Joins a player, waiting until the room has processed it so the
    /// caller knows the `room_update` broadcast is on its way.
    pub async fn join(
        &self,
        player_id: PlayerId,
        username: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            username,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Starts the game (fire-and-forget).
    pub async fn start_game(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::StartGame).await
    }

    /// Submits a round result (fire-and-forget).
    pub async fn submit_result(
        &self,
        player_id: PlayerId,
        duration: u64,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::SubmitResult {
            player_id,
            duration,
        })
        .await
    }

    /// Advances to the next round (fire-and-forget).
    pub async fn next_round(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::NextRound).await
    }

    /// Records a spell selection (fire-and-forget).
    pub async fn select_spell(
        &self,
        player_id: PlayerId,
        spell_id: SpellId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::SelectSpell { player_id, spell_id })
            .await
    }

    /// Removes a disconnected player and reports what happened.
    pub async fn disconnect(
        &self,
        player_id: PlayerId,
    ) -> Result<DisconnectOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Disconnect {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the current room snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx })
            .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    timer: IntermissionTimer,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties or all handles drop.
    ///
    /// Commands and timer fires go through the same `select!`, so the
    /// timer callback runs with exclusive access to the room state like
    /// any other command.
    async fn run(mut self) {
        info!(room_id = %self.room.id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
                epoch = self.timer.fired() => {
                    self.handle_timer_fire(epoch);
                }
            }
        }

        info!(room_id = %self.room.id, "room actor stopped");
    }

    /// Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                username,
                sender,
                reply,
            } => {
                self.handle_join(player_id, username, sender);
                let _ = reply.send(());
            }
            RoomCommand::StartGame => self.handle_start_game(),
            RoomCommand::SubmitResult {
                player_id,
                duration,
            } => self.handle_submit_result(player_id, duration),
            RoomCommand::NextRound => self.handle_next_round(),
            RoomCommand::SelectSpell {
                player_id,
                spell_id,
            } => self.handle_select_spell(player_id, spell_id),
            RoomCommand::Disconnect { player_id, reply } => {
                let outcome = self.handle_disconnect(player_id);
                let _ = reply.send(outcome);
                return outcome.room_empty;
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.room.snapshot());
            }
        }
        false
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        username: Option<String>,
        sender: PlayerSender,
    ) {
        self.room.add_player(player_id, username);
        // A rejoin replaces the outbound channel so events reach the
        // live connection.
        self.senders.insert(player_id, sender);

        info!(
            room_id = %self.room.id,
            %player_id,
            players = self.room.players.len(),
            "player joined"
        );

        self.broadcast_room_update();
    }

    /// Starts a fresh game. Deliberately unguarded: any member may
    /// trigger it from any state, and mid-game it acts as a full
    /// restart. Bumping the epoch stales any armed intermission timer.
    fn handle_start_game(&mut self) {
        self.room.status = RoomStatus::Racing;
        self.room.round = 1;
        self.room.epoch += 1;
        self.room.reset_for_new_game();

        info!(
            room_id = %self.room.id,
            epoch = self.room.epoch,
            "game started"
        );

        self.broadcast(ServerEvent::GlobalStartRound {
            round: 1,
            active_spells: None,
        });
        self.broadcast_room_update();
    }

    fn handle_submit_result(&mut self, player_id: PlayerId, duration: u64) {
        match self.room.player_mut(player_id) {
            Some(player) => {
                player.finish_time = Some(now_ms());
                player.round_duration = Some(duration);
                player.total_duration =
                    player.total_duration.saturating_add(duration);
                info!(
                    room_id = %self.room.id,
                    %player_id,
                    duration,
                    "result recorded"
                );
            }
            None => {
                debug!(
                    room_id = %self.room.id,
                    %player_id,
                    "result from non-member, ignoring"
                );
            }
        }

        // Completion is re-checked even for a non-member submit; the
        // broadcast below keeps everyone's view current either way.
        self.check_round_completion();
    }

    /// Manual advance, available to anyone without waiting out the
    /// intermission. Only `finish_time` is cleared — the previous
    /// round's duration stays visible until results come in — and no
    /// spells resolve on this path.
    fn handle_next_round(&mut self) {
        // Saturating: a client can send this arbitrarily often.
        self.room.round = self.room.round.saturating_add(1);
        self.room.status = RoomStatus::Racing;
        self.room.epoch += 1;
        for player in &mut self.room.players {
            player.finish_time = None;
        }

        info!(
            room_id = %self.room.id,
            round = self.room.round,
            epoch = self.room.epoch,
            "round advanced manually"
        );

        self.broadcast(ServerEvent::GlobalStartRound {
            round: self.room.round,
            active_spells: None,
        });
        self.broadcast_room_update();
    }

    fn handle_select_spell(&mut self, player_id: PlayerId, spell_id: SpellId) {
        match self.room.player_mut(player_id) {
            Some(player) => {
                player.selected_spell = Some(spell_id.clone());
            }
            None => {
                debug!(
                    room_id = %self.room.id,
                    %player_id,
                    "spell selection from non-member, ignoring"
                );
                return;
            }
        }

        info!(
            room_id = %self.room.id,
            %player_id,
            spell = %spell_id,
            "spell selected"
        );
        self.broadcast_room_update();
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) -> DisconnectOutcome {
        let Some(player) = self.room.remove_player(player_id) else {
            return DisconnectOutcome {
                removed: false,
                room_empty: false,
            };
        };
        self.senders.remove(&player_id);

        info!(
            room_id = %self.room.id,
            %player_id,
            players = self.room.players.len(),
            "player left"
        );

        if self.room.players.is_empty() {
            info!(room_id = %self.room.id, "room empty, shutting down");
            return DisconnectOutcome {
                removed: true,
                room_empty: true,
            };
        }

        if player.is_host {
            self.room.players[0].is_host = true;
            info!(
                room_id = %self.room.id,
                new_host = %self.room.players[0].id,
                "host migrated"
            );
        }

        if self.room.status.is_in_game() && self.room.players.len() == 1 {
            // Last player standing wins on the spot. The epoch bump
            // stales any deadline armed for the interrupted
            // intermission; victory is terminal.
            self.room.status = RoomStatus::Victory;
            self.room.epoch += 1;
            let rankings = vec![self.room.players[0].snapshot()];
            info!(
                room_id = %self.room.id,
                winner = %self.room.players[0].id,
                "last player standing"
            );
            self.broadcast(ServerEvent::GameOver { rankings });
            self.broadcast_room_update();
        } else if self.room.status == RoomStatus::Racing {
            // The departed player may have been the only one still
            // racing.
            self.check_round_completion();
        } else {
            self.broadcast_room_update();
        }

        DisconnectOutcome {
            removed: true,
            room_empty: false,
        }
    }

    /// Checks whether everyone has finished and, if so, transitions to
    /// the scoreboard (arming the intermission timer) or to victory
    /// after the final round. Always ends with a `room_update`.
    fn check_round_completion(&mut self) {
        if self.room.players.is_empty() || !self.room.all_finished() {
            self.broadcast_room_update();
            return;
        }

        let rankings = rank_players(&self.room.players, RankKey::TotalDuration);

        if self.room.round < ROUNDS_PER_GAME {
            self.room.status = RoomStatus::Scoreboard;
            info!(
                room_id = %self.room.id,
                round = self.room.round,
                "round finished, intermission started"
            );
            self.broadcast(ServerEvent::RoundFinished { rankings });
            self.broadcast_room_update();
            self.timer.arm(self.room.epoch);
        } else {
            // Victory is terminal; the epoch bump stales any deadline
            // still armed from an earlier intermission.
            self.room.status = RoomStatus::Victory;
            self.room.epoch += 1;
            info!(room_id = %self.room.id, "game over");
            self.broadcast(ServerEvent::GameOver { rankings });
            self.broadcast_room_update();
        }
    }

    /// Timer-driven advance at the end of an intermission. A fire
    /// stamped with an old epoch means the round it was scheduled for
    /// is gone (restart or manual advance happened since) and is
    /// dropped.
    fn handle_timer_fire(&mut self, epoch: u64) {
        if epoch != self.room.epoch {
            debug!(
                room_id = %self.room.id,
                fired = epoch,
                current = self.room.epoch,
                "stale intermission timer, ignoring"
            );
            return;
        }

        self.room.round = self.room.round.saturating_add(1);
        self.room.status = RoomStatus::Racing;
        self.room.epoch += 1;

        let active_spells = resolve_spells(&mut self.room.players);
        self.room.reset_for_next_round();

        info!(
            room_id = %self.room.id,
            round = self.room.round,
            epoch = self.room.epoch,
            "intermission over, next round started"
        );

        self.broadcast(ServerEvent::GlobalStartRound {
            round: self.room.round,
            active_spells: Some(active_spells),
        });
        self.broadcast_room_update();
    }

    fn broadcast_room_update(&self) {
        self.broadcast(ServerEvent::RoomUpdate {
            room: self.room.snapshot(),
        });
    }

    /// Sends an event to every member. Silently drops players whose
    /// receiver is gone (connection already closed).
    fn broadcast(&self, event: ServerEvent) {
        for player in &self.room.players {
            if let Some(sender) = self.senders.get(&player.id) {
                let _ = sender.send(event.clone());
            }
        }
    }
}

/// Milliseconds since the Unix epoch; clamps to zero if the clock is
/// before 1970.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` controls backpressure — a full inbox makes senders
/// wait rather than pile up unboundedly.
pub(crate) fn spawn_room(
    room_id: RoomId,
    timer_config: TimerConfig,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(room_id.clone()),
        senders: HashMap::new(),
        timer: IntermissionTimer::new(timer_config),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
