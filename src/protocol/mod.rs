//! 와이어 프로토콜

pub mod messages;

pub use messages::*;

/// 수신 텍스트 프레임 디코딩. 실패 시 호출자가 로그 후 버린다.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// 송신 메시지 직렬화 (브로드캐스트당 한 번)
pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_create_race_without_config() {
        let msg = decode_client_message(r#"{"type":"create_race","name":"alice"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRace {
                name: "alice".to_string(),
                config: None,
            }
        );
    }

    #[test]
    fn decodes_camel_case_fields() {
        let msg =
            decode_client_message(r#"{"type":"join_race","raceId":"abc234","name":"bob"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRace {
                race_id: "abc234".to_string(),
                name: "bob".to_string(),
            }
        );

        let msg = decode_client_message(
            r#"{"type":"update_config","config":{"mode":"time","wordCount":30,"timeLimit":15}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::UpdateConfig {
                config: RaceConfig {
                    mode: RaceMode::Time,
                    word_count: 30,
                    time_limit: 15,
                }
            }
        );
    }

    #[test]
    fn partial_config_takes_defaults() {
        let msg = decode_client_message(r#"{"type":"update_config","config":{"mode":"time"}}"#)
            .unwrap();
        let ClientMessage::UpdateConfig { config } = msg else {
            panic!("expected update_config");
        };
        assert_eq!(config.mode, RaceMode::Time);
        assert_eq!(config.word_count, 30);
        assert_eq!(config.time_limit, 60);
    }

    #[test]
    fn rejects_unknown_tags_and_garbage() {
        assert!(decode_client_message(r#"{"type":"teleport"}"#).is_err());
        assert!(decode_client_message("not json").is_err());
        assert!(decode_client_message(r#"{"type":"progress_update","progress":"lots"}"#).is_err());
    }

    #[test]
    fn server_messages_use_flat_tagged_shape() {
        let encoded = encode_server_message(&ServerMessage::ParticipantFinished {
            participant_id: "p_abc".to_string(),
            position: 0,
            finish_time: 1234,
            wpm: 72.5,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "participant_finished",
                "participantId": "p_abc",
                "position": 0,
                "finishTime": 1234,
                "wpm": 72.5
            })
        );
    }

    #[test]
    fn participant_omits_unset_result_fields() {
        let p = Participant::new("p_1".to_string(), "alice".to_string());
        let value = serde_json::to_value(&p).unwrap();
        assert!(value.get("finishTime").is_none());
        assert!(value.get("position").is_none());
        assert_eq!(value["finished"], json!(false));
    }

    #[test]
    fn kind_matches_wire_tag() {
        let msg = ServerMessage::TimeUpdate { time_remaining: 9 };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!(msg.kind()));
        assert_eq!(value["timeRemaining"], json!(9));
    }
}
