//! 핸들러 모듈

pub mod broadcast;
pub mod clock;
pub mod connection;
pub mod race;

pub use connection::*;
pub use race::*;

use crate::protocol::ClientMessage;
use crate::state::AppState;
use std::sync::Arc;

/// 클라이언트 메시지 분기
pub async fn handle_client_message(state: &Arc<AppState>, peer_id: &str, msg: ClientMessage) {
    match msg {
        ClientMessage::CreateRace { name, config } => {
            handle_create_race(state.clone(), peer_id, &name, config).await;
        }
        ClientMessage::JoinRace { race_id, name } => {
            handle_join_race(state.clone(), peer_id, &race_id, &name).await;
        }
        ClientMessage::UpdateConfig { config } => {
            handle_update_config(state.clone(), peer_id, config).await;
        }
        ClientMessage::StartRace => {
            handle_start_race(state.clone(), peer_id).await;
        }
        ClientMessage::ProgressUpdate { progress, wpm } => {
            handle_progress_update(state.clone(), peer_id, progress, wpm).await;
        }
        ClientMessage::FinishRace { wpm } => {
            handle_finish_race(state.clone(), peer_id, wpm).await;
        }
        ClientMessage::LeaveRace => {
            handle_leave_race(state.clone(), peer_id).await;
        }
    }
}
