use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fakenews::auth::{AdminVerifier, AuthConfig};
use fakenews::config::ServerConfig;
use fakenews::machine::AdvanceOutcome;
use fakenews::protocol::{ClientMessage, ServerMessage};
use fakenews::scoring::ScoreCategory;
use fakenews::state::AppState;
use fakenews::types::{GameStatus, Language, Pin, Role};
use fakenews::ws::handlers::{handle_message, Session};
use std::sync::Arc;
use tower::ServiceExt;

fn seeded_state(seed: u64, auth: AuthConfig) -> Arc<AppState> {
    let config = ServerConfig {
        seed: Some(seed),
        ..ServerConfig::default()
    };
    Arc::new(AppState::new(config, auth))
}

async fn create_game(state: &AppState, admin: &mut Session) -> Pin {
    match handle_message(ClientMessage::AdminCreateGame, admin, state).await {
        Some(ServerMessage::GameCreated { pin }) => pin,
        other => panic!("Expected GameCreated, got {:?}", other),
    }
}

async fn join(state: &AppState, pin: &Pin, name: &str) -> Session {
    let mut session = Session::new(Role::Player, Language::En);
    let msg = ClientMessage::JoinGame {
        pin: pin.clone(),
        name: name.to_string(),
    };
    match handle_message(msg, &mut session, state).await {
        Some(ServerMessage::Joined {
            pin: joined_pin,
            player_id,
            name: joined_name,
            ..
        }) => {
            assert_eq!(&joined_pin, pin);
            assert_eq!(joined_name, name);
            assert_eq!(session.player_id.as_deref(), Some(player_id.as_str()));
        }
        other => panic!("Expected Joined, got {:?}", other),
    }
    session
}

async fn advance(state: &AppState, admin: &mut Session, from: GameStatus) -> GameStatus {
    let msg = ClientMessage::AdminAdvance { from: Some(from) };
    match handle_message(msg, admin, state).await {
        Some(ServerMessage::Advanced {
            from: actual,
            to,
            outcome,
        }) => {
            assert_eq!(actual, from);
            assert_eq!(outcome, AdvanceOutcome::Advanced);
            to
        }
        other => panic!("Expected Advanced, got {:?}", other),
    }
}

/// Answer every sentence of the open round, either all right or all wrong
async fn answer_round(state: &AppState, session: &mut Session, round: u8, correct: bool) {
    let pin = session.pin.clone().unwrap();
    let game = state.get_game(&pin).await.unwrap();
    for sentence in &game.rounds[&round].sentences {
        let msg = ClientMessage::SubmitAnswer {
            round,
            sentence_id: sentence.id.clone(),
            is_fake: sentence.is_fake == correct,
        };
        match handle_message(msg, session, state).await {
            Some(ServerMessage::AnswerAck { sentence_id, .. }) => {
                assert_eq!(sentence_id, sentence.id)
            }
            other => panic!("Expected AnswerAck, got {:?}", other),
        }
    }
}

fn error_code(msg: Option<ServerMessage>) -> String {
    match msg {
        Some(ServerMessage::Error { code, .. }) => code,
        other => panic!("Expected Error, got {:?}", other),
    }
}

/// End-to-end integration test for a complete game
#[tokio::test]
async fn test_full_game_flow() {
    let state = seeded_state(7, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);

    // 1. Setup: create game
    let pin = create_game(&state, &mut admin).await;
    assert_eq!(admin.pin.as_deref(), Some(pin.as_str()));
    assert_eq!(state.get_game(&pin).await.unwrap().status, GameStatus::Lobby);

    // 2. Players join
    let mut alice = join(&state, &pin, "Alice").await;
    let mut bob = join(&state, &pin, "Bob").await;

    // 3. Start: round 1 has 7 sentences
    match handle_message(ClientMessage::AdminStartGame, &mut admin, &state).await {
        Some(ServerMessage::Advanced { to, .. }) => assert_eq!(to, GameStatus::Round1),
        other => panic!("Expected Advanced, got {:?}", other),
    }
    let game = state.get_game(&pin).await.unwrap();
    assert_eq!(game.rounds[&1].sentences.len(), 7);

    // 4. Ready flags are cleared on the way to round 2
    let ready = handle_message(ClientMessage::SetReady { ready: true }, &mut alice, &state).await;
    assert_eq!(ready, Some(ServerMessage::ReadyAck { ready: true }));
    assert_eq!(
        advance(&state, &mut admin, GameStatus::Round1).await,
        GameStatus::Round2
    );
    let game = state.get_game(&pin).await.unwrap();
    assert!(game.rounds.contains_key(&2));
    assert!(game.players.values().all(|p| !p.round1_ready));

    // 5. Alice answers everything right, Bob everything wrong
    answer_round(&state, &mut alice, 2, true).await;
    answer_round(&state, &mut bob, 2, false).await;

    // 6. Advance scores round 2
    assert_eq!(
        advance(&state, &mut admin, GameStatus::Round2).await,
        GameStatus::Round3
    );
    let game = state.get_game(&pin).await.unwrap();
    let alice_id = alice.player_id.clone().unwrap();
    let bob_id = bob.player_id.clone().unwrap();
    assert_eq!(game.players[&alice_id].score, 100);
    assert_eq!(game.players[&bob_id].score, 0);

    // 7. Stop: results, Alice above Bob
    assert_eq!(
        handle_message(ClientMessage::AdminStopGame, &mut admin, &state).await,
        None
    );
    assert_eq!(state.get_game(&pin).await.unwrap().status, GameStatus::Results);

    match handle_message(ClientMessage::RequestLeaderboard, &mut bob, &state).await {
        Some(ServerMessage::Leaderboard { entries, categories }) => {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].player_name, "Alice");
            assert_eq!(entries[0].category, ScoreCategory::LieHunter);
            assert_eq!(entries[0].category_label, "Lie Hunter");
            assert_eq!(entries[1].player_name, "Bob");
            assert_eq!(entries[1].category, ScoreCategory::Victim);
            assert_eq!(categories.iter().map(|c| c.count).sum::<usize>(), 2);
        }
        other => panic!("Expected Leaderboard, got {:?}", other),
    }
}

#[tokio::test]
async fn test_player_cannot_send_admin_messages() {
    let state = seeded_state(1, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let pin = create_game(&state, &mut admin).await;
    let mut player = join(&state, &pin, "Mallory").await;

    let code = error_code(handle_message(ClientMessage::AdminStartGame, &mut player, &state).await);
    assert_eq!(code, "UNAUTHORIZED");
    assert_eq!(state.get_game(&pin).await.unwrap().status, GameStatus::Lobby);

    let code = error_code(handle_message(ClientMessage::AdminCreateGame, &mut player, &state).await);
    assert_eq!(code, "UNAUTHORIZED");
    assert_eq!(state.store.pins().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_advance_is_noop() {
    let state = seeded_state(2, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let pin = create_game(&state, &mut admin).await;
    join(&state, &pin, "Alice").await;
    handle_message(ClientMessage::AdminStartGame, &mut admin, &state).await;

    advance(&state, &mut admin, GameStatus::Round1).await;
    let round2 = state.get_game(&pin).await.unwrap().rounds[&2].clone();

    // A second click from a dashboard that still shows round 1
    let msg = ClientMessage::AdminAdvance {
        from: Some(GameStatus::Round1),
    };
    match handle_message(msg, &mut admin, &state).await {
        Some(ServerMessage::Advanced { outcome, .. }) => {
            assert_eq!(outcome, AdvanceOutcome::AlreadyAdvanced)
        }
        other => panic!("Expected Advanced, got {:?}", other),
    }

    let game = state.get_game(&pin).await.unwrap();
    assert_eq!(game.status, GameStatus::Round2);
    assert_eq!(game.rounds[&2], round2);
    assert!(!game.rounds.contains_key(&3));
}

#[tokio::test]
async fn test_restart_resets_progress_keeps_roster() {
    let state = seeded_state(3, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let pin = create_game(&state, &mut admin).await;
    let mut alice = join(&state, &pin, "Alice").await;
    handle_message(ClientMessage::AdminStartGame, &mut admin, &state).await;
    advance(&state, &mut admin, GameStatus::Round1).await;
    answer_round(&state, &mut alice, 2, true).await;
    advance(&state, &mut admin, GameStatus::Round2).await;

    handle_message(ClientMessage::AdminRestartGame, &mut admin, &state).await;

    let game = state.get_game(&pin).await.unwrap();
    assert_eq!(game.status, GameStatus::Lobby);
    assert!(game.rounds.is_empty());
    assert_eq!(game.current_round, None);
    let player = &game.players[alice.player_id.as_ref().unwrap()];
    assert_eq!(player.name, "Alice");
    assert_eq!(player.score, 0);
    assert!(player.answers.is_empty());
    assert!(!player.round1_ready);
}

#[tokio::test]
async fn test_kicked_player_loses_access() {
    let state = seeded_state(4, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let pin = create_game(&state, &mut admin).await;
    join(&state, &pin, "Alice").await;
    let mut bob = join(&state, &pin, "Bob").await;
    handle_message(ClientMessage::AdminStartGame, &mut admin, &state).await;

    let kick = ClientMessage::AdminKickPlayer {
        player_id: bob.player_id.clone().unwrap(),
    };
    assert_eq!(handle_message(kick, &mut admin, &state).await, None);
    assert_eq!(state.get_game(&pin).await.unwrap().players.len(), 1);

    let ready = ClientMessage::SetReady { ready: true };
    let code = error_code(handle_message(ready, &mut bob, &state).await);
    assert_eq!(code, "PLAYER_NOT_FOUND");
}

#[tokio::test]
async fn test_late_join_and_rejoin() {
    let state = seeded_state(5, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let pin = create_game(&state, &mut admin).await;

    let mut first = Session::new(Role::Player, Language::En);
    let token = match handle_message(
        ClientMessage::JoinGame {
            pin: pin.clone(),
            name: "Alice".to_string(),
        },
        &mut first,
        &state,
    )
    .await
    {
        Some(ServerMessage::Joined { token, .. }) => token,
        other => panic!("Expected Joined, got {:?}", other),
    };
    handle_message(ClientMessage::AdminStartGame, &mut admin, &state).await;

    let mut late = Session::new(Role::Player, Language::En);
    let join = ClientMessage::JoinGame {
        pin: pin.clone(),
        name: "Carol".to_string(),
    };
    assert_eq!(error_code(handle_message(join, &mut late, &state).await), "JOIN_CLOSED");

    // A reloaded browser keeps its identity
    let mut reloaded = Session::new(Role::Player, Language::He);
    let rejoin = ClientMessage::Rejoin {
        pin: pin.clone(),
        player_id: first.player_id.clone().unwrap(),
        token: "wrong".to_string(),
    };
    assert_eq!(
        error_code(handle_message(rejoin, &mut reloaded, &state).await),
        "PLAYER_NOT_FOUND"
    );
    let rejoin = ClientMessage::Rejoin {
        pin: pin.clone(),
        player_id: first.player_id.clone().unwrap(),
        token,
    };
    match handle_message(rejoin, &mut reloaded, &state).await {
        Some(ServerMessage::Joined { player_id, .. }) => {
            assert_eq!(Some(player_id), first.player_id)
        }
        other => panic!("Expected Joined, got {:?}", other),
    }
    let ready = ClientMessage::SetReady { ready: true };
    assert_eq!(
        handle_message(ready, &mut reloaded, &state).await,
        Some(ServerMessage::ReadyAck { ready: true })
    );
}

#[tokio::test]
async fn test_regenerate_pin_moves_session() {
    let state = seeded_state(6, AuthConfig::disabled());
    let mut admin = Session::new(Role::Admin, Language::En);
    let old_pin = create_game(&state, &mut admin).await;

    let new_pin = match handle_message(ClientMessage::AdminRegeneratePin, &mut admin, &state).await
    {
        Some(ServerMessage::PinChanged { old_pin: old, new_pin }) => {
            assert_eq!(old, old_pin);
            new_pin
        }
        other => panic!("Expected PinChanged, got {:?}", other),
    };
    assert_ne!(new_pin, old_pin);
    assert_eq!(admin.pin.as_deref(), Some(new_pin.as_str()));
    assert!(state.store.get(&old_pin).await.unwrap().is_none());
    assert!(state.store.get(&new_pin).await.unwrap().is_some());
}

#[tokio::test]
async fn test_watch_rejects_bad_pins() {
    let state = seeded_state(8, AuthConfig::disabled());
    let mut viewer = Session::new(Role::Player, Language::En);

    let watch = ClientMessage::Watch {
        pin: "12ab".to_string(),
    };
    assert_eq!(error_code(handle_message(watch, &mut viewer, &state).await), "INVALID_PIN");

    let watch = ClientMessage::Watch {
        pin: "123456".to_string(),
    };
    assert_eq!(error_code(handle_message(watch, &mut viewer, &state).await), "GAME_NOT_FOUND");
    assert_eq!(viewer.pin, None);
}

// HTTP API

fn enabled_auth() -> AuthConfig {
    AuthConfig::new(
        Some("admin".to_string()),
        Some("hunter2".to_string()),
        "test-secret".to_string(),
    )
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: axum::Router, password: &str) -> axum::response::Response {
    let credentials = STANDARD.encode(format!("admin:{}", password));
    app.oneshot(
        Request::post("/api/admin/login")
            .header(header::AUTHORIZATION, format!("Basic {}", credentials))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = fakenews::app(seeded_state(1, enabled_auth()));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_and_create_game() {
    let state = seeded_state(1, enabled_auth());
    let app = fakenews::app(state.clone());

    let response = login(app.clone(), "wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(app.clone(), "hunter2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(state.verify_admin(&token));

    let response = app
        .clone()
        .oneshot(Request::post("/api/games").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/games")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pin = body_json(response).await["pin"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get(format!("/api/games/{}", pin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["pin"], pin.as_str());
    assert_eq!(summary["status"], "lobby");
    assert_eq!(summary["player_count"], 0);
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let app = fakenews::app(seeded_state(1, enabled_auth()));
    let response = app
        .oneshot(
            Request::get("/api/games/999999/leaderboard?lang=he")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "GAME_NOT_FOUND");
}

#[tokio::test]
async fn test_export_requires_admin_token() {
    let state = seeded_state(1, enabled_auth());
    state.create_game("admin".to_string()).await.unwrap();
    let app = fakenews::app(state.clone());

    let response = app
        .clone()
        .oneshot(Request::get("/api/state/export").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = state.auth.login("admin", "hunter2").unwrap();
    let response = app
        .oneshot(
            Request::get("/api/state/export")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let export = body_json(response).await;
    assert_eq!(export["games"].as_array().unwrap().len(), 1);
}

struct SingleToken;

impl AdminVerifier for SingleToken {
    fn verify_admin(&self, token: &str) -> bool {
        token == "ops-token"
    }
}

#[tokio::test]
async fn test_admin_routes_use_injected_verifier() {
    let config = ServerConfig {
        seed: Some(1),
        ..ServerConfig::default()
    };
    let state = Arc::new(
        AppState::new(config, AuthConfig::disabled()).with_verifier(Arc::new(SingleToken)),
    );
    let app = fakenews::app(state);

    let response = app
        .clone()
        .oneshot(Request::post("/api/games").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::post("/api/games")
                .header(header::AUTHORIZATION, "Bearer ops-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
