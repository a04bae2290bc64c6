//! 연결 핸들러

use crate::handlers::race::leave_race_internal;
use crate::state::{AppState, OutboundSender, PeerSession};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 새 연결 처리
pub async fn handle_connection(state: Arc<AppState>, sender: OutboundSender) -> String {
    let peer_id = Uuid::new_v4().to_string();

    let session = PeerSession {
        id: peer_id.clone(),
        binding: RwLock::new(None),
        sender,
        connected_at: Instant::now(),
    };

    state.peers.insert(peer_id.clone(), session);

    tracing::info!(peer_id = %peer_id, "New connection established");
    peer_id
}

/// 연결 해제 처리. 명시적 leave_race와 동일하게 취급한다.
pub async fn handle_disconnect(state: Arc<AppState>, peer_id: &str) {
    if let Some((_, session)) = state.peers.remove(peer_id) {
        let binding = session.binding.write().await.take();
        if let Some(binding) = binding {
            leave_race_internal(&state, &binding.race_id, &binding.participant_id).await;
        }
        tracing::info!(
            peer_id = %session.id,
            connected_secs = session.connected_at.elapsed().as_secs(),
            "Connection closed"
        );
    }
}
