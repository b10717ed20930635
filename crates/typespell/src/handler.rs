//! Per-connection handler: event pump, command dispatch, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The connection *is* the player: its minted id identifies
//! the player everywhere, and no handshake or authentication happens
//! before commands flow.
//!
//! Two tasks per connection: this one reads and dispatches commands,
//! and a writer pump drains the player's event channel onto the
//! socket. Room actors (and `cast_spell` peers) push into the channel
//! without ever touching the socket.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};
use typespell_protocol::{
    ClientCommand, Codec, PlayerId, RoomId, ServerEvent, SpellId,
};
use typespell_room::PlayerSender;
use typespell_transport::WsConnection;

use crate::server::ServerState;
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WsConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let player_id = conn.id();
    let conn = Arc::new(conn);
    debug!(%player_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.connections.lock().await.insert(player_id, tx.clone());

    // Writer pump: events → JSON frames. Lives until the event channel
    // or the socket closes.
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let text = match codec.encode(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(error = %e, "failed to encode event");
                        continue;
                    }
                };
                if conn.send(&text).await.is_err() {
                    break;
                }
            }
        })
    };

    // Command loop.
    loop {
        match conn.recv().await {
            Ok(Some(text)) => {
                let cmd: ClientCommand = match state.codec.decode(&text) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        // Bad frames are dropped, the connection lives on.
                        debug!(%player_id, error = %e, "unparseable command");
                        continue;
                    }
                };
                dispatch(&state, player_id, &tx, cmd).await;
            }
            Ok(None) => {
                info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                debug!(%player_id, error = %e, "recv error");
                break;
            }
        }
    }

    // Cleanup: forget the connection, then leave every room. Ordering
    // matters — once the sender is out of the map, no new event can be
    // addressed to this connection.
    state.connections.lock().await.remove(&player_id);
    state.rooms.lock().await.disconnect(player_id).await;
    writer.abort();

    Ok(())
}

/// Routes one command. Failures are absorbed: the protocol has no
/// error events, so a command against a missing room is logged and
/// dropped.
async fn dispatch(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    sender: &PlayerSender,
    cmd: ClientCommand,
) {
    let result = match cmd {
        ClientCommand::JoinRoom { room_id, username } => {
            state
                .rooms
                .lock()
                .await
                .join_room(player_id, room_id, username, sender.clone())
                .await
        }
        ClientCommand::StartGame { room_id } => {
            state.rooms.lock().await.start_game(&room_id).await
        }
        ClientCommand::SubmitResult { room_id, duration } => {
            state
                .rooms
                .lock()
                .await
                .submit_result(&room_id, player_id, duration)
                .await
        }
        ClientCommand::NextRound { room_id } => {
            state.rooms.lock().await.next_round(&room_id).await
        }
        ClientCommand::SelectSpell { room_id, spell_id } => {
            state
                .rooms
                .lock()
                .await
                .select_spell(&room_id, player_id, spell_id)
                .await
        }
        ClientCommand::CastSpell {
            room_id,
            target_id,
            spell_id,
        } => {
            cast_spell(state, player_id, &room_id, target_id, spell_id).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        debug!(%player_id, error = %e, "command dropped");
    }
}

/// Forwards a cast straight to the target's connection.
///
/// Deliberately bypasses the room layer: no membership, status, or
/// ownership check, matching the trust model of the rest of the
/// protocol. The target sees the spell even if caster and target share
/// no room.
async fn cast_spell(
    state: &Arc<ServerState>,
    caster_id: PlayerId,
    room_id: &RoomId,
    target_id: PlayerId,
    spell_id: SpellId,
) {
    let connections = state.connections.lock().await;
    match connections.get(&target_id) {
        Some(target) => {
            info!(
                %room_id,
                %caster_id,
                %target_id,
                spell = %spell_id,
                "spell cast"
            );
            let _ = target.send(ServerEvent::ReceiveSpell {
                spell_id,
                caster_id,
            });
        }
        None => {
            debug!(
                %caster_id,
                %target_id,
                "cast at unknown connection, dropped"
            );
        }
    }
}
