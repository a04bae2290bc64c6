//! HTTP 엔드포인트 테스트

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tokio::sync::mpsc;
use tower::ServiceExt;
use typerace_relay::config::Config;
use typerace_relay::handlers;
use typerace_relay::protocol::ClientMessage;
use typerace_relay::server;
use typerace_relay::state::AppState;

async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = server::router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_counts() {
    let state = Arc::new(AppState::new(Config::default()));

    let (status, body) = get_json(state.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["connections"], 0);

    let (tx, _rx) = mpsc::unbounded_channel();
    let peer_id = handlers::handle_connection(state.clone(), tx).await;
    handlers::handle_client_message(
        &state,
        &peer_id,
        ClientMessage::CreateRace {
            name: "alice".to_string(),
            config: None,
        },
    )
    .await;

    let (_, body) = get_json(state, "/health").await;
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["connections"], 1);
}

#[tokio::test]
async fn index_names_the_websocket_endpoint() {
    let state = Arc::new(AppState::new(Config::default()));
    let response = server::router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/ws"));
}

#[tokio::test]
async fn shutdown_tears_down_registry() {
    let state = Arc::new(AppState::new(Config::default()));
    let (tx, _rx) = mpsc::unbounded_channel();
    let peer_id = handlers::handle_connection(state.clone(), tx).await;
    handlers::handle_client_message(
        &state,
        &peer_id,
        ClientMessage::CreateRace {
            name: "alice".to_string(),
            config: None,
        },
    )
    .await;
    handlers::handle_client_message(&state, &peer_id, ClientMessage::StartRace).await;
    assert_eq!(state.timers.len(), 1);

    let mut shutdown = state.subscribe_shutdown();
    state.shutdown();

    assert!(state.sessions.is_empty());
    assert!(state.timers.is_empty());
    assert!(shutdown.has_changed().unwrap());
}
