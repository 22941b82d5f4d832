use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::time::timeout;
use uuid::Uuid;
use warp::test::{ws, WsClient};

use super::connection::ConnectionManager;
use crate::arbitration::{ArbitrationPipeline, InMemoryVerdictStore, JudgeClient, JudgeError};
use crate::bus::InMemoryBus;
use crate::config::Config;
use crate::create_routes;
use crate::registry::RoomRegistry;
use grid_core::{WordLibrary, WordList};
use crate::room_task::RoomCommand;
use grid_types::{
    ClientEvent, Difficulty, JudgeDecision, Language, PresenceStatus, RejectReason, RoomError,
    RoomSettings, ServerEvent, WordVerdict,
};

struct OfflineJudge;

#[async_trait]
impl JudgeClient for OfflineJudge {
    async fn judge(&self, _word: &str, _language: Language) -> Result<JudgeDecision, JudgeError> {
        Err(JudgeError::Unavailable("offline".to_string()))
    }
}

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        word_lists_dir: String::new(),
        // Short validating window so lifecycle tests settle quickly.
        validating_grace_ms: 200,
        combo_window_ms: 3000,
        crowd_vote_threshold: 6,
        judge_confidence_threshold: 85,
        judge_url: String::new(),
        judge_timeout_ms: 1000,
        idle_after_seconds: 30,
        afk_after_seconds: 90,
        disconnect_after_seconds: 180,
        room_teardown_seconds: 600,
        presence_sweep_seconds: 10,
        tournament_intermission_seconds: 8,
        connection_timeout_seconds: 300,
    }
}

fn test_state() -> (Arc<ConnectionManager>, Arc<RoomRegistry>) {
    let connections = Arc::new(ConnectionManager::new());
    let library = Arc::new(WordLibrary::new(vec![WordList::new(
        Language::English,
        "star\ndogs\nrats\n",
    )]));
    let arbitration = Arc::new(ArbitrationPipeline::new(
        library,
        Arc::new(InMemoryVerdictStore::new()),
        Arc::new(OfflineJudge),
        6,
        85,
    ));
    let registry = Arc::new(RoomRegistry::new(
        arbitration,
        Arc::new(InMemoryBus::new()),
        connections.clone(),
        Arc::new(test_config()),
    ));
    (connections, registry)
}

fn settings(round_seconds: u32) -> RoomSettings {
    RoomSettings {
        language: Language::English,
        difficulty: Difficulty::Easy,
        round_seconds,
        min_word_len: 3,
    }
}

async fn send(client: &mut WsClient, event: &ClientEvent) {
    client
        .send(warp::ws::Message::text(
            serde_json::to_string(event).unwrap(),
        ))
        .await;
}

async fn recv(client: &mut WsClient) -> ServerEvent {
    let message = timeout(Duration::from_secs(2), client.next())
        .await
        .expect("Timeout waiting for server event")
        .expect("WebSocket closed")
        .expect("WebSocket error");
    serde_json::from_str(message.to_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_create_join_and_host_controls() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut ws1 = ws()
        .path("/ws")
        .handshake(routes.clone())
        .await
        .expect("WebSocket handshake failed");
    let mut ws2 = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    send(
        &mut ws1,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;

    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut ws1).await else {
        panic!("Expected RoomCreated");
    };
    let ServerEvent::RosterUpdated { players } = recv(&mut ws1).await else {
        panic!("Expected RosterUpdated");
    };
    assert_eq!(players.len(), 1);
    assert!(players[0].is_host);

    send(
        &mut ws2,
        &ClientEvent::Join {
            room_code: room_code.clone(),
            player_id: bob,
            username: "bob".to_string(),
        },
    )
    .await;

    // Both sockets see the join broadcast.
    for client in [&mut ws1, &mut ws2] {
        let ServerEvent::RosterUpdated { players } = recv(client).await else {
            panic!("Expected RosterUpdated");
        };
        assert_eq!(players.len(), 2);
    }

    // Heartbeat answers on the heartbeating socket only.
    send(
        &mut ws2,
        &ClientEvent::Heartbeat {
            room_code: room_code.clone(),
            player_id: bob,
        },
    )
    .await;
    assert!(matches!(recv(&mut ws2).await, ServerEvent::Pong));

    // Non-host kick is refused without touching the roster.
    send(
        &mut ws2,
        &ClientEvent::KickPlayer {
            room_code: room_code.clone(),
            player_id: bob,
            target: "alice".to_string(),
        },
    )
    .await;
    let ServerEvent::ActionRejected { error } = recv(&mut ws2).await else {
        panic!("Expected ActionRejected");
    };
    assert_eq!(error, RoomError::NotHost);

    // Host handoff reaches everyone.
    send(
        &mut ws1,
        &ClientEvent::TransferHost {
            room_code: room_code.clone(),
            player_id: alice,
            target: "bob".to_string(),
        },
    )
    .await;
    let ServerEvent::HostChanged { username } = recv(&mut ws1).await else {
        panic!("Expected HostChanged");
    };
    assert_eq!(username, "bob");
    assert!(matches!(
        recv(&mut ws2).await,
        ServerEvent::HostChanged { .. }
    ));
}

#[tokio::test]
async fn test_round_lifecycle_runs_to_results() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            // Zero-length round: the timer fires as soon as play starts.
            settings: settings(0),
        },
    )
    .await;

    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut client).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut client).await;

    send(
        &mut client,
        &ClientEvent::StartRound {
            room_code: room_code.clone(),
            player_id: alice,
        },
    )
    .await;

    let ServerEvent::RoundStarted { round, grid, .. } = recv(&mut client).await else {
        panic!("Expected RoundStarted");
    };
    assert_eq!(round, 1);
    assert_eq!(grid.rows, 4);
    assert_eq!(grid.cols, 4);

    let ServerEvent::ValidatingStarted { round } = recv(&mut client).await else {
        panic!("Expected ValidatingStarted");
    };
    assert_eq!(round, 1);

    let ServerEvent::RoundResults { round, results } = recv(&mut client).await else {
        panic!("Expected RoundResults");
    };
    assert_eq!(round, 1);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, 0);
    let _roster = recv(&mut client).await;

    // Results phase allows the host to start the next round.
    send(
        &mut client,
        &ClientEvent::StartRound {
            room_code,
            player_id: alice,
        },
    )
    .await;
    let ServerEvent::RoundStarted { round, .. } = recv(&mut client).await else {
        panic!("Expected RoundStarted");
    };
    assert_eq!(round, 2);
}

#[tokio::test]
async fn test_structural_rejection_and_duplicate() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            settings: settings(60),
        },
    )
    .await;

    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut client).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut client).await;

    send(
        &mut client,
        &ClientEvent::StartRound {
            room_code: room_code.clone(),
            player_id: alice,
        },
    )
    .await;
    let _round_started = recv(&mut client).await;

    // Below the length floor: rejected without arbitration.
    send(
        &mut client,
        &ClientEvent::SubmitWord {
            room_code: room_code.clone(),
            player_id: alice,
            word: "zz".to_string(),
            claimed_combo: None,
        },
    )
    .await;
    let ServerEvent::WordResult { outcome, .. } = recv(&mut client).await else {
        panic!("Expected WordResult");
    };
    assert_eq!(
        outcome.verdict,
        WordVerdict::Rejected {
            reason: RejectReason::TooShort
        }
    );
    assert_eq!(outcome.score, 0);

    // Resubmitting the same word is a duplicate, not a second rejection.
    send(
        &mut client,
        &ClientEvent::SubmitWord {
            room_code,
            player_id: alice,
            word: "ZZ".to_string(),
            claimed_combo: Some(7),
        },
    )
    .await;
    let ServerEvent::WordResult { outcome, .. } = recv(&mut client).await else {
        panic!("Expected WordResult");
    };
    assert_eq!(outcome.verdict, WordVerdict::Duplicate);
    // The claimed combo on the wire never reaches scoring.
    assert_eq!(outcome.combo_level, 0);
}

#[tokio::test]
async fn test_tournament_create_and_cancel() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;
    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut client).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut client).await;

    send(
        &mut client,
        &ClientEvent::CreateTournament {
            room_code: room_code.clone(),
            player_id: alice,
            rounds: 3,
        },
    )
    .await;
    let ServerEvent::TournamentStandings {
        current_round,
        total_rounds,
        complete,
        ..
    } = recv(&mut client).await
    else {
        panic!("Expected TournamentStandings");
    };
    assert_eq!(current_round, 0);
    assert_eq!(total_rounds, 3);
    assert!(!complete);

    send(
        &mut client,
        &ClientEvent::CancelTournament {
            room_code: room_code.clone(),
            player_id: alice,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut client).await,
        ServerEvent::TournamentCancelled
    ));

    // Cancellation is final: a second cancel has nothing to act on.
    send(
        &mut client,
        &ClientEvent::CancelTournament {
            room_code,
            player_id: alice,
        },
    )
    .await;
    let ServerEvent::ActionRejected { error } = recv(&mut client).await else {
        panic!("Expected ActionRejected");
    };
    assert_eq!(error, RoomError::NoTournamentActive);
}

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    send(
        &mut client,
        &ClientEvent::Join {
            room_code: "ZZZZZ".to_string(),
            player_id: Uuid::new_v4(),
            username: "alice".to_string(),
        },
    )
    .await;

    let ServerEvent::ActionRejected { error } = recv(&mut client).await else {
        panic!("Expected ActionRejected");
    };
    assert!(matches!(error, RoomError::RoomNotFound { .. }));
}

#[tokio::test]
async fn test_malformed_payload_keeps_socket_open() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    client.send(warp::ws::Message::text("not json")).await;
    let ServerEvent::ActionRejected { error } = recv(&mut client).await else {
        panic!("Expected ActionRejected");
    };
    assert!(matches!(error, RoomError::InvalidPayload { .. }));

    // The socket still works afterwards.
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: Uuid::new_v4(),
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut client).await,
        ServerEvent::RoomCreated { .. }
    ));
}

#[tokio::test]
async fn test_refused_join_surfaces_rejection() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut ws1 = ws()
        .path("/ws")
        .handshake(routes.clone())
        .await
        .expect("WebSocket handshake failed");
    let mut ws2 = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    send(
        &mut ws1,
        &ClientEvent::CreateRoom {
            player_id: Uuid::new_v4(),
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;
    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut ws1).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut ws1).await;

    // Taken username: the joiner hears why instead of silence.
    send(
        &mut ws2,
        &ClientEvent::Join {
            room_code,
            player_id: Uuid::new_v4(),
            username: "alice".to_string(),
        },
    )
    .await;
    let ServerEvent::ActionRejected { error } = recv(&mut ws2).await else {
        panic!("Expected ActionRejected");
    };
    assert_eq!(
        error,
        RoomError::UsernameTaken {
            username: "alice".to_string()
        }
    );

    // The refused socket is not left bound to the room and stays usable.
    send(
        &mut ws2,
        &ClientEvent::CreateRoom {
            player_id: Uuid::new_v4(),
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut ws2).await,
        ServerEvent::RoomCreated { .. }
    ));
}

#[tokio::test]
async fn test_submission_lands_during_validating_grace() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry);

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            settings: settings(0),
        },
    )
    .await;
    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut client).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut client).await;

    send(
        &mut client,
        &ClientEvent::StartRound {
            room_code: room_code.clone(),
            player_id: alice,
        },
    )
    .await;
    let _round_started = recv(&mut client).await;
    assert!(matches!(
        recv(&mut client).await,
        ServerEvent::ValidatingStarted { .. }
    ));

    // The timer has expired but the grace window is still open: a word
    // arriving now gets a verdict instead of a wrong-phase rejection.
    send(
        &mut client,
        &ClientEvent::SubmitWord {
            room_code,
            player_id: alice,
            word: "zz".to_string(),
            claimed_combo: None,
        },
    )
    .await;
    let ServerEvent::WordResult { outcome, .. } = recv(&mut client).await else {
        panic!("Expected WordResult");
    };
    assert_eq!(
        outcome.verdict,
        WordVerdict::Rejected {
            reason: RejectReason::TooShort
        }
    );

    let ServerEvent::RoundResults { round, .. } = recv(&mut client).await else {
        panic!("Expected RoundResults");
    };
    assert_eq!(round, 1);
}

#[tokio::test]
async fn test_heartbeat_does_not_clear_afk() {
    let (connections, registry) = test_state();
    let routes = create_routes(connections, registry.clone());

    let mut client = ws()
        .path("/ws")
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    let alice = Uuid::new_v4();
    send(
        &mut client,
        &ClientEvent::CreateRoom {
            player_id: alice,
            username: "alice".to_string(),
            settings: settings(90),
        },
    )
    .await;
    let ServerEvent::RoomCreated { room_code, .. } = recv(&mut client).await else {
        panic!("Expected RoomCreated");
    };
    let _roster = recv(&mut client).await;

    send(
        &mut client,
        &ClientEvent::PresenceUpdate {
            room_code: room_code.clone(),
            player_id: alice,
            status: PresenceStatus::Afk,
        },
    )
    .await;
    let ServerEvent::PresenceChanged { status, .. } = recv(&mut client).await else {
        panic!("Expected PresenceChanged");
    };
    assert_eq!(status, PresenceStatus::Afk);

    // Automatic heartbeats keep the connection alive without undoing a
    // self-declared afk.
    send(
        &mut client,
        &ClientEvent::Heartbeat {
            room_code: room_code.clone(),
            player_id: alice,
        },
    )
    .await;
    assert!(matches!(recv(&mut client).await, ServerEvent::Pong));

    let tx = registry.get(&room_code).await.expect("room exists");
    let (reply, response) = tokio::sync::oneshot::channel();
    tx.send(RoomCommand::Snapshot { reply }).unwrap();
    let summary = response.await.unwrap();
    assert_eq!(summary.players[0].presence, PresenceStatus::Afk);

    // A deliberate action lifts it.
    send(
        &mut client,
        &ClientEvent::StartRound {
            room_code,
            player_id: alice,
        },
    )
    .await;
    let ServerEvent::PresenceChanged { status, .. } = recv(&mut client).await else {
        panic!("Expected PresenceChanged");
    };
    assert_eq!(status, PresenceStatus::Active);
    assert!(matches!(
        recv(&mut client).await,
        ServerEvent::RoundStarted { .. }
    ));
}
