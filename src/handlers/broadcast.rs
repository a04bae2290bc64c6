//! 세션 브로드캐스트 / 개별 전송

use crate::error::RaceError;
use crate::protocol::{encode_server_message, ServerMessage};
use crate::state::{AppState, OutboundSender, SessionEntry};

/// 세션의 모든 연결에 전송 (선택적으로 한 연결 제외).
/// 직렬화는 한 번만 하고, 닫힌 연결은 조용히 건너뛴다.
pub fn broadcast(entry: &SessionEntry, message: &ServerMessage, exclude_peer: Option<&str>) {
    let Some(json) = encode(message) else {
        return;
    };

    let mut delivered = 0usize;
    for connection in entry.connections.values() {
        if exclude_peer == Some(connection.peer_id.as_str()) {
            continue;
        }
        if deliver(&connection.sender, json.clone()) {
            delivered += 1;
        } else {
            tracing::debug!(peer_id = %connection.peer_id, "Skipped closed connection");
        }
    }

    tracing::debug!(
        race_id = %entry.session.code(),
        kind = message.kind(),
        delivered = delivered,
        "Broadcast"
    );
}

/// 단일 연결에 전송. 닫혀 있으면 아무것도 하지 않는다.
pub fn send_private(sender: &OutboundSender, message: &ServerMessage) {
    if let Some(json) = encode(message) {
        deliver(sender, json);
    }
}

/// 피어 ID로 개별 전송
pub fn send_to_peer(state: &AppState, peer_id: &str, message: &ServerMessage) {
    if let Some(session) = state.peers.get(peer_id) {
        send_private(&session.sender, message);
    }
}

/// 요청자에게만 에러 통지
pub fn reply_error(state: &AppState, peer_id: &str, error: &RaceError) {
    tracing::warn!(peer_id = %peer_id, error = %error, "Rejected action");
    send_to_peer(state, peer_id, &ServerMessage::error(error.to_string()));
}

fn encode(message: &ServerMessage) -> Option<String> {
    match encode_server_message(message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(kind = message.kind(), error = %e, "Failed to encode message");
            None
        }
    }
}

fn deliver(sender: &OutboundSender, json: String) -> bool {
    !sender.is_closed() && sender.send(json).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Participant, RaceConfig};
    use crate::race::{Session, WordListSampler};
    use crate::state::Connection;
    use tokio::sync::mpsc;

    fn entry_with(peers: &[(&str, &OutboundSender)]) -> SessionEntry {
        let host = Participant::new("p_0".to_string(), "alice".to_string());
        let session = Session::new(
            "ABC234".to_string(),
            host,
            RaceConfig::default(),
            3,
            &WordListSampler,
        );
        let mut entry = SessionEntry::new(session, 1);
        for (i, (peer_id, sender)) in peers.iter().enumerate() {
            entry.connections.insert(
                format!("p_{}", i),
                Connection {
                    peer_id: peer_id.to_string(),
                    sender: (*sender).clone(),
                },
            );
        }
        entry
    }

    #[test]
    fn broadcast_skips_excluded_and_closed() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, rx_c) = mpsc::unbounded_channel::<String>();
        drop(rx_c);

        let entry = entry_with(&[("a", &tx_a), ("b", &tx_b), ("c", &tx_c)]);
        let message = ServerMessage::TimeUpdate { time_remaining: 5 };
        broadcast(&entry, &message, Some("b"));

        let received: ServerMessage = serde_json::from_str(&rx_a.try_recv().unwrap()).unwrap();
        assert_eq!(received, message);
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn send_private_to_closed_is_noop() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        send_private(&tx, &ServerMessage::error("gone"));
    }
}
