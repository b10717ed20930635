//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use typespell::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port with a short intermission and
/// returns its address.
async fn start_server() -> String {
    let server = TypespellServerBuilder::new()
        .bind("127.0.0.1:0")
        .timer_config(TimerConfig::with_intermission(Duration::from_millis(
            50,
        )))
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_cmd(ws: &mut ClientWs, cmd: &ClientCommand) {
    let text = serde_json::to_string(cmd).expect("encode command");
    ws.send(Message::text(text)).await.expect("send command");
}

/// Reads frames until the next decodable event arrives.
async fn next_event(ws: &mut ClientWs) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("connection closed")
            .expect("recv failed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("decode event");
        }
    }
}

/// Reads events until one matches.
async fn wait_for(
    ws: &mut ClientWs,
    mut pred: impl FnMut(&ServerEvent) -> bool,
) -> ServerEvent {
    loop {
        let event = next_event(ws).await;
        if pred(&event) {
            return event;
        }
    }
}

fn join(room: &str, name: &str) -> ClientCommand {
    ClientCommand::JoinRoom {
        room_id: RoomId::new(room),
        username: Some(name.to_string()),
    }
}

/// Joins and returns the player's own id, read from the first
/// `room_update` (the joiner is always the last player listed).
async fn join_and_id(ws: &mut ClientWs, room: &str, name: &str) -> PlayerId {
    send_cmd(ws, &join(room, name)).await;
    let event = wait_for(ws, |e| {
        matches!(e, ServerEvent::RoomUpdate { .. })
    })
    .await;
    let ServerEvent::RoomUpdate { room } = event else {
        unreachable!()
    };
    room.players.last().expect("joiner listed").id
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_broadcasts_room_update() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    send_cmd(&mut alice, &join("r1", "alice")).await;
    let event = next_event(&mut alice).await;
    let ServerEvent::RoomUpdate { room } = event else {
        panic!("expected room_update, got {event:?}");
    };
    assert_eq!(room.id, RoomId::new("r1"));
    assert_eq!(room.status, RoomStatus::Lobby);
    assert_eq!(room.players.len(), 1);
    assert!(room.players[0].is_host);
    assert_eq!(room.players[0].name, "alice");

    // The second join reaches the first client too.
    let mut bob = connect(&addr).await;
    send_cmd(&mut bob, &join("r1", "bob")).await;

    let event = wait_for(&mut alice, |e| {
        matches!(e, ServerEvent::RoomUpdate { room } if room.players.len() == 2)
    })
    .await;
    let ServerEvent::RoomUpdate { room } = event else {
        unreachable!()
    };
    assert_eq!(room.players[1].name, "bob");
    assert!(!room.players[1].is_host);
}

#[tokio::test]
async fn test_start_game_begins_round_one() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    join_and_id(&mut alice, "r2", "alice").await;

    send_cmd(
        &mut alice,
        &ClientCommand::StartGame {
            room_id: RoomId::new("r2"),
        },
    )
    .await;

    let event = wait_for(&mut alice, |e| {
        matches!(e, ServerEvent::GlobalStartRound { .. })
    })
    .await;
    assert!(matches!(
        event,
        ServerEvent::GlobalStartRound {
            round: 1,
            active_spells: None,
        }
    ));

    let event = wait_for(&mut alice, |e| {
        matches!(e, ServerEvent::RoomUpdate { .. })
    })
    .await;
    let ServerEvent::RoomUpdate { room } = event else {
        unreachable!()
    };
    assert_eq!(room.status, RoomStatus::Racing);
}

#[tokio::test]
async fn test_round_results_produce_rankings() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join_and_id(&mut alice, "r3", "alice").await;
    join_and_id(&mut bob, "r3", "bob").await;

    send_cmd(
        &mut alice,
        &ClientCommand::StartGame {
            room_id: RoomId::new("r3"),
        },
    )
    .await;

    send_cmd(
        &mut alice,
        &ClientCommand::SubmitResult {
            room_id: RoomId::new("r3"),
            duration: 9000,
        },
    )
    .await;
    send_cmd(
        &mut bob,
        &ClientCommand::SubmitResult {
            room_id: RoomId::new("r3"),
            duration: 4000,
        },
    )
    .await;

    let event = wait_for(&mut alice, |e| {
        matches!(e, ServerEvent::RoundFinished { .. })
    })
    .await;
    let ServerEvent::RoundFinished { rankings } = event else {
        unreachable!()
    };
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0].name, "bob");
    assert_eq!(rankings[1].name, "alice");
}

#[tokio::test]
async fn test_cast_spell_reaches_target_only() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    let alice_id = join_and_id(&mut alice, "r4", "alice").await;
    let bob_id = join_and_id(&mut bob, "r4", "bob").await;

    send_cmd(
        &mut bob,
        &ClientCommand::CastSpell {
            room_id: RoomId::new("r4"),
            target_id: alice_id,
            spell_id: SpellId::new("heavy_freeze"),
        },
    )
    .await;

    let event = wait_for(&mut alice, |e| {
        matches!(e, ServerEvent::ReceiveSpell { .. })
    })
    .await;
    let ServerEvent::ReceiveSpell {
        spell_id,
        caster_id,
    } = event
    else {
        unreachable!()
    };
    assert_eq!(spell_id, SpellId::new("heavy_freeze"));
    assert_eq!(caster_id, bob_id);

    // The caster gets nothing back — a cast is silent on their end.
    let quiet =
        tokio::time::timeout(Duration::from_millis(100), bob.next()).await;
    assert!(quiet.is_err(), "caster received an unexpected frame");
}

#[tokio::test]
async fn test_disconnect_migrates_host() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join_and_id(&mut alice, "r5", "alice").await;
    let bob_id = join_and_id(&mut bob, "r5", "bob").await;

    alice.close(None).await.expect("close");

    let event = wait_for(&mut bob, |e| {
        matches!(e, ServerEvent::RoomUpdate { room } if room.players.len() == 1)
    })
    .await;
    let ServerEvent::RoomUpdate { room } = event else {
        unreachable!()
    };
    assert_eq!(room.players[0].id, bob_id);
    assert!(room.players[0].is_host);
}

#[tokio::test]
async fn test_mid_game_disconnect_ends_in_victory() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join_and_id(&mut alice, "r6", "alice").await;
    let bob_id = join_and_id(&mut bob, "r6", "bob").await;

    send_cmd(
        &mut alice,
        &ClientCommand::StartGame {
            room_id: RoomId::new("r6"),
        },
    )
    .await;
    wait_for(&mut bob, |e| {
        matches!(e, ServerEvent::GlobalStartRound { .. })
    })
    .await;

    alice.close(None).await.expect("close");

    let event = wait_for(&mut bob, |e| {
        matches!(e, ServerEvent::GameOver { .. })
    })
    .await;
    let ServerEvent::GameOver { rankings } = event else {
        unreachable!()
    };
    assert_eq!(rankings.len(), 1);
    assert_eq!(rankings[0].id, bob_id);
}

#[tokio::test]
async fn test_bad_frame_is_ignored() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;

    alice
        .send(Message::text("this is not a command"))
        .await
        .expect("send garbage");

    // The connection survives and later commands still work.
    send_cmd(&mut alice, &join("r7", "alice")).await;
    let event = next_event(&mut alice).await;
    assert!(matches!(event, ServerEvent::RoomUpdate { .. }));
}

#[tokio::test]
async fn test_command_for_unknown_room_is_dropped() {
    let addr = start_server().await;
    let mut alice = connect(&addr).await;
    join_and_id(&mut alice, "r8", "alice").await;

    // Targets a room that was never created; no event and no close.
    send_cmd(
        &mut alice,
        &ClientCommand::StartGame {
            room_id: RoomId::new("missing"),
        },
    )
    .await;

    let quiet =
        tokio::time::timeout(Duration::from_millis(100), alice.next()).await;
    assert!(quiet.is_err(), "unexpected frame for a dropped command");
}
