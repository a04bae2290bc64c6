//! 레이스 세션 핸들러

use crate::error::RaceError;
use crate::handlers::broadcast::{broadcast, reply_error, send_private, send_to_peer};
use crate::handlers::clock;
use crate::protocol::{Participant, RaceConfig, RaceStatus, ServerMessage};
use crate::race::ids::{generate_code, generate_participant_id, normalize_code};
use crate::race::{validate_config, validate_name, Departure, Session};
use crate::state::{AppState, Binding, Connection, SessionEntry};
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 현재 시각 (epoch ms)
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// 연결의 현재 바인딩
pub async fn binding_of(state: &AppState, peer_id: &str) -> Option<Binding> {
    match state.peers.get(peer_id) {
        Some(session) => session.binding.read().await.clone(),
        None => None,
    }
}

async fn set_binding(state: &AppState, peer_id: &str, binding: Option<Binding>) {
    if let Some(session) = state.peers.get(peer_id) {
        *session.binding.write().await = binding;
    }
}

/// 레이스 생성 처리
pub async fn handle_create_race(
    state: Arc<AppState>,
    peer_id: &str,
    name: &str,
    config: Option<RaceConfig>,
) {
    let name = match validate_name(name) {
        Ok(name) => name,
        Err(e) => return reply_error(&state, peer_id, &e),
    };
    let config = config.unwrap_or_default();
    if let Err(e) = validate_config(&config) {
        return reply_error(&state, peer_id, &e);
    }

    // 한 연결은 한 세션에만 속한다
    leave_current(&state, peer_id).await;

    let Some(sender) = state.peers.get(peer_id).map(|s| s.sender.clone()) else {
        return;
    };

    let (race_id, participant_id) = {
        let mut rng = rand::thread_rng();
        let participant_id = generate_participant_id(&mut rng);

        // 충돌 시 재생성
        let vacant = loop {
            match state.sessions.entry(generate_code(&mut rng)) {
                Entry::Vacant(vacant) => break vacant,
                Entry::Occupied(occupied) => {
                    tracing::debug!(race_id = %occupied.key(), "Race code collision, regenerating");
                }
            }
        };
        let race_id = vacant.key().clone();

        let participant = Participant::new(participant_id.clone(), name.clone());
        let session = Session::new(
            race_id.clone(),
            participant.clone(),
            config,
            state.config.race.countdown_seconds,
            state.sampler.as_ref(),
        );
        let mut entry = SessionEntry::new(session, state.next_generation());
        entry.connections.insert(
            participant_id.clone(),
            Connection {
                peer_id: peer_id.to_string(),
                sender: sender.clone(),
            },
        );
        let entry = vacant.insert(entry);

        send_private(
            &sender,
            &ServerMessage::RaceCreated {
                race_id: race_id.clone(),
                participant,
            },
        );
        send_private(
            &sender,
            &ServerMessage::RaceJoined {
                race_state: entry.session.snapshot(),
                participant_id: participant_id.clone(),
            },
        );

        (race_id, participant_id)
    };

    set_binding(
        &state,
        peer_id,
        Some(Binding {
            race_id: race_id.clone(),
            participant_id: participant_id.clone(),
        }),
    )
    .await;

    tracing::info!(
        race_id = %race_id,
        peer_id = %peer_id,
        participant_id = %participant_id,
        name = %name,
        mode = ?config.mode,
        "Race created"
    );
}

/// 레이스 참여 처리
pub async fn handle_join_race(state: Arc<AppState>, peer_id: &str, race_id: &str, name: &str) {
    let name = match validate_name(name) {
        Ok(name) => name,
        Err(e) => return reply_error(&state, peer_id, &e),
    };
    let race_id = normalize_code(race_id);

    // 이미 같은 레이스에 있으면 현재 상태만 다시 보낸다
    if let Some(current) = binding_of(&state, peer_id).await {
        if current.race_id == race_id {
            if let Some(entry) = state.sessions.get(&race_id) {
                send_to_peer(
                    &state,
                    peer_id,
                    &ServerMessage::RaceJoined {
                        race_state: entry.session.snapshot(),
                        participant_id: current.participant_id,
                    },
                );
            }
            return;
        }
    }

    // 검증이 끝나기 전에는 현재 세션을 떠나지 않는다
    let admissible = match state.sessions.get(&race_id) {
        Some(entry) => entry
            .session
            .check_admit(&name, state.config.race.max_participants),
        None => Err(RaceError::NotFound),
    };
    if let Err(e) = admissible {
        return reply_error(&state, peer_id, &e);
    }

    leave_current(&state, peer_id).await;

    let Some(sender) = state.peers.get(peer_id).map(|s| s.sender.clone()) else {
        return;
    };

    let joined = {
        let Some(mut entry) = state.sessions.get_mut(&race_id) else {
            return reply_error(&state, peer_id, &RaceError::NotFound);
        };

        let participant_id = {
            let mut rng = rand::thread_rng();
            loop {
                let id = generate_participant_id(&mut rng);
                if entry.session.participant(&id).is_none() {
                    break id;
                }
            }
        };

        match entry.session.admit(
            participant_id.clone(),
            name.clone(),
            state.config.race.max_participants,
        ) {
            Ok(participant) => {
                entry.connections.insert(
                    participant_id.clone(),
                    Connection {
                        peer_id: peer_id.to_string(),
                        sender: sender.clone(),
                    },
                );
                send_private(
                    &sender,
                    &ServerMessage::RaceJoined {
                        race_state: entry.session.snapshot(),
                        participant_id: participant_id.clone(),
                    },
                );
                broadcast(
                    &entry,
                    &ServerMessage::ParticipantJoined { participant },
                    Some(peer_id),
                );
                Ok((participant_id, entry.session.participants().len()))
            }
            Err(e) => Err(e),
        }
    };

    match joined {
        Ok((participant_id, roster_size)) => {
            set_binding(
                &state,
                peer_id,
                Some(Binding {
                    race_id: race_id.clone(),
                    participant_id: participant_id.clone(),
                }),
            )
            .await;
            tracing::info!(
                race_id = %race_id,
                peer_id = %peer_id,
                participant_id = %participant_id,
                name = %name,
                roster_size = roster_size,
                "Participant joined race"
            );
        }
        Err(e) => reply_error(&state, peer_id, &e),
    }
}

/// 설정 변경 처리 (호스트 전용)
pub async fn handle_update_config(state: Arc<AppState>, peer_id: &str, config: RaceConfig) {
    let Some(binding) = binding_of(&state, peer_id).await else {
        return reply_error(&state, peer_id, &RaceError::NotInRace);
    };

    let result = match state.sessions.get_mut(&binding.race_id) {
        Some(mut entry) => entry
            .session
            .update_config(&binding.participant_id, config, state.sampler.as_ref())
            .map(|event| broadcast(&entry, &event, None)),
        None => Err(RaceError::NotFound),
    };

    match result {
        Ok(()) => tracing::info!(
            race_id = %binding.race_id,
            mode = ?config.mode,
            word_count = config.word_count,
            time_limit = config.time_limit,
            "Race config updated"
        ),
        Err(e) => reply_error(&state, peer_id, &e),
    }
}

/// 레이스 시작 처리 (호스트 전용)
pub async fn handle_start_race(state: Arc<AppState>, peer_id: &str) {
    let Some(binding) = binding_of(&state, peer_id).await else {
        return reply_error(&state, peer_id, &RaceError::NotInRace);
    };

    let result = match state.sessions.get_mut(&binding.race_id) {
        Some(mut entry) => entry
            .session
            .begin_countdown(&binding.participant_id)
            .map(|event| {
                broadcast(&entry, &event, None);
                (entry.generation, entry.session.countdown_seconds())
            }),
        None => Err(RaceError::NotFound),
    };

    match result {
        Ok((generation, countdown_seconds)) => {
            tracing::info!(
                race_id = %binding.race_id,
                countdown_seconds = countdown_seconds,
                "Countdown started"
            );
            clock::spawn_race_driver(
                state.clone(),
                binding.race_id,
                generation,
                countdown_seconds,
            );
        }
        Err(e) => reply_error(&state, peer_id, &e),
    }
}

/// 진행률 갱신 처리. 늦게 도착한 메시지는 조용히 무시한다.
pub async fn handle_progress_update(state: Arc<AppState>, peer_id: &str, progress: f64, wpm: f64) {
    let Some(binding) = binding_of(&state, peer_id).await else {
        return;
    };
    let Some(mut entry) = state.sessions.get_mut(&binding.race_id) else {
        return;
    };

    if let Some(event) = entry
        .session
        .record_progress(&binding.participant_id, progress, wpm)
    {
        broadcast(&entry, &event, None);
    }
}

/// 완주 처리. 늦게 도착했거나 중복된 메시지는 조용히 무시한다.
pub async fn handle_finish_race(state: Arc<AppState>, peer_id: &str, wpm: f64) {
    let Some(binding) = binding_of(&state, peer_id).await else {
        return;
    };

    let completed = {
        let Some(mut entry) = state.sessions.get_mut(&binding.race_id) else {
            return;
        };
        let events = entry
            .session
            .record_finish(&binding.participant_id, wpm, now_millis());
        for event in &events {
            if let ServerMessage::ParticipantFinished {
                position,
                finish_time,
                ..
            } = event
            {
                tracing::info!(
                    race_id = %binding.race_id,
                    participant_id = %binding.participant_id,
                    position = position,
                    finish_time_ms = finish_time,
                    wpm = wpm,
                    "Participant finished"
                );
            }
            broadcast(&entry, event, None);
        }

        (!events.is_empty() && entry.session.status() == RaceStatus::Finished)
            .then_some(entry.generation)
    };

    if let Some(generation) = completed {
        tracing::info!(race_id = %binding.race_id, "Race finished");
        clock::schedule_retention(state.clone(), binding.race_id, generation);
    }
}

/// 레이스 나가기 처리
pub async fn handle_leave_race(state: Arc<AppState>, peer_id: &str) {
    leave_current(&state, peer_id).await;
}

/// 연결의 바인딩을 풀고 소속 세션에서 이탈시킨다
pub async fn leave_current(state: &Arc<AppState>, peer_id: &str) {
    let binding = match state.peers.get(peer_id) {
        Some(session) => session.binding.write().await.take(),
        None => None,
    };

    if let Some(binding) = binding {
        leave_race_internal(state, &binding.race_id, &binding.participant_id).await;
    }
}

/// 레이스 이탈 내부 로직
pub async fn leave_race_internal(state: &Arc<AppState>, race_id: &str, participant_id: &str) {
    let outcome = {
        let Some(mut entry) = state.sessions.get_mut(race_id) else {
            return;
        };
        entry.connections.remove(participant_id);
        let Some(departure) = entry.session.remove_participant(participant_id) else {
            return;
        };

        broadcast(
            &entry,
            &ServerMessage::ParticipantLeft {
                participant_id: participant_id.to_string(),
            },
            None,
        );

        tracing::info!(
            race_id = %race_id,
            participant_id = %participant_id,
            remaining = entry.session.participants().len(),
            "Participant left race"
        );

        match departure {
            Departure::Close => Some((entry.generation, true)),
            Departure::Stay {
                new_host,
                completion,
            } => {
                if let Some(host_id) = new_host {
                    tracing::info!(race_id = %race_id, host_id = %host_id, "Host transferred");
                }
                match completion {
                    Some(event) => {
                        broadcast(&entry, &event, None);
                        tracing::info!(race_id = %race_id, "Race finished after departure");
                        Some((entry.generation, false))
                    }
                    None => None,
                }
            }
        }
    };

    match outcome {
        Some((generation, true)) => {
            close_session(state, race_id, generation, Some("The host has left the race")).await;
        }
        Some((generation, false)) => {
            clock::schedule_retention(state.clone(), race_id.to_string(), generation);
        }
        None => {}
    }
}

/// 세션 삭제: 타이머 취소, 남은 연결 바인딩 해제
pub async fn close_session(
    state: &AppState,
    race_id: &str,
    generation: u64,
    notice: Option<&str>,
) {
    let Some((_, entry)) = state
        .sessions
        .remove_if(race_id, |_, entry| entry.generation == generation)
    else {
        return;
    };
    state.timers.cancel(race_id, generation);

    for connection in entry.connections.values() {
        if let Some(message) = notice {
            send_private(&connection.sender, &ServerMessage::error(message));
        }
        if let Some(peer) = state.peers.get(&connection.peer_id) {
            let mut binding = peer.binding.write().await;
            if binding.as_ref().map(|b| b.race_id.as_str()) == Some(race_id) {
                *binding = None;
            }
        }
    }

    tracing::info!(
        race_id = %race_id,
        lifetime_secs = entry.created_at.elapsed().as_secs(),
        "Race deleted"
    );
}
