//! 세션 상태 머신
//!
//! waiting → countdown → racing → finished 순서로만 진행한다.
//! 모든 메서드는 동기적이며 호출자가 세션 단위 락을 잡은 상태에서 호출한다.
//! 상태를 바꾼 결과로 브로드캐스트할 이벤트를 생산 순서대로 돌려준다.

use crate::error::{RaceError, RaceResult};
use crate::protocol::{Participant, RaceConfig, RaceMode, RaceState, RaceStatus, ServerMessage};
use crate::race::ranking;
use crate::race::text::{words_for, TextSampler};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 20;
pub const MAX_WORD_COUNT: u32 = 500;
pub const MAX_TIME_LIMIT: u32 = 600;

/// 이름 검증 후 앞뒤 공백 제거본 반환
pub fn validate_name(raw: &str) -> RaceResult<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err(RaceError::InvalidName("Please enter a username"));
    }
    if len < NAME_MIN_CHARS {
        return Err(RaceError::InvalidName(
            "Username must be at least 2 characters",
        ));
    }
    if len > NAME_MAX_CHARS {
        return Err(RaceError::InvalidName(
            "Username must be 20 characters or less",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_config(config: &RaceConfig) -> RaceResult<()> {
    if !(1..=MAX_WORD_COUNT).contains(&config.word_count) {
        return Err(RaceError::InvalidConfig(format!(
            "word count must be between 1 and {}",
            MAX_WORD_COUNT
        )));
    }
    if !(1..=MAX_TIME_LIMIT).contains(&config.time_limit) {
        return Err(RaceError::InvalidConfig(format!(
            "time limit must be between 1 and {} seconds",
            MAX_TIME_LIMIT
        )));
    }
    Ok(())
}

/// 참가자 이탈 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Departure {
    /// 세션을 즉시 삭제해야 함 (빈 로스터, 또는 대기 중 호스트 이탈)
    Close,
    Stay {
        /// 호스트가 넘어간 경우 새 호스트 ID
        new_host: Option<String>,
        /// 남은 인원이 모두 완주해 레이스가 끝난 경우 race_finished
        completion: Option<ServerMessage>,
    },
}

/// 레이스 세션
#[derive(Debug, Clone)]
pub struct Session {
    code: String,
    status: RaceStatus,
    participants: Vec<Participant>,
    text: Vec<String>,
    countdown_seconds: u32,
    start_time: Option<u64>,
    time_remaining: Option<u32>,
    host_id: String,
    config: RaceConfig,
    /// 지금까지 완주한 인원 (이탈자 포함)
    finish_count: u32,
}

impl Session {
    pub fn new(
        code: String,
        host: Participant,
        config: RaceConfig,
        countdown_seconds: u32,
        sampler: &dyn TextSampler,
    ) -> Self {
        Self {
            code,
            status: RaceStatus::Waiting,
            host_id: host.id.clone(),
            participants: vec![host],
            text: sampler.sample(words_for(&config)),
            countdown_seconds,
            start_time: None,
            time_remaining: None,
            config,
            finish_count: 0,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn countdown_seconds(&self) -> u32 {
        self.countdown_seconds
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn time_remaining(&self) -> Option<u32> {
        self.time_remaining
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn snapshot(&self) -> RaceState {
        RaceState {
            race_id: self.code.clone(),
            status: self.status,
            participants: self.participants.clone(),
            text: self.text.clone(),
            countdown_seconds: self.countdown_seconds,
            start_time: self.start_time,
            host_id: self.host_id.clone(),
            config: self.config,
            time_remaining: self.time_remaining,
        }
    }

    /// 참가 가능 여부만 확인한다. 상태는 바꾸지 않는다.
    pub fn check_admit(&self, name: &str, capacity: usize) -> RaceResult<()> {
        if self.status != RaceStatus::Waiting {
            return Err(RaceError::AlreadyStarted);
        }
        if self.participants.len() >= capacity {
            return Err(RaceError::Full { max: capacity });
        }
        let lowered = name.to_lowercase();
        if self
            .participants
            .iter()
            .any(|p| p.name.to_lowercase() == lowered)
        {
            return Err(RaceError::NameTaken);
        }
        Ok(())
    }

    /// 새 참가자 추가. `name`은 이미 검증된 값이어야 한다.
    pub fn admit(&mut self, id: String, name: String, capacity: usize) -> RaceResult<Participant> {
        self.check_admit(&name, capacity)?;

        let participant = Participant::new(id, name);
        self.participants.push(participant.clone());
        Ok(participant)
    }

    fn ensure_host_waiting(
        &self,
        requester: &str,
        action: &'static str,
        locked: RaceError,
    ) -> RaceResult<()> {
        if self.host_id != requester {
            return Err(RaceError::NotHost { action });
        }
        if self.status != RaceStatus::Waiting {
            return Err(locked);
        }
        Ok(())
    }

    /// 설정 변경 (호스트, 대기 중에만). 텍스트를 새로 생성한다.
    pub fn update_config(
        &mut self,
        requester: &str,
        config: RaceConfig,
        sampler: &dyn TextSampler,
    ) -> RaceResult<ServerMessage> {
        self.ensure_host_waiting(requester, "change settings", RaceError::SettingsLocked)?;
        validate_config(&config)?;

        self.config = config;
        self.text = sampler.sample(words_for(&config));
        Ok(ServerMessage::ConfigUpdated { config })
    }

    /// waiting → countdown
    pub fn begin_countdown(&mut self, requester: &str) -> RaceResult<ServerMessage> {
        self.ensure_host_waiting(requester, "start the race", RaceError::AlreadyStarted)?;

        self.status = RaceStatus::Countdown;
        Ok(ServerMessage::CountdownStart {
            countdown_seconds: self.countdown_seconds,
        })
    }

    /// countdown → racing. 카운트다운 상태가 아니면 None.
    pub fn begin_racing(&mut self, now_ms: u64) -> Option<ServerMessage> {
        if self.status != RaceStatus::Countdown {
            return None;
        }

        self.status = RaceStatus::Racing;
        self.start_time = Some(now_ms);
        self.time_remaining = match self.config.mode {
            RaceMode::Time => Some(self.config.time_limit),
            RaceMode::Words => None,
        };

        Some(ServerMessage::RaceStart {
            start_time: now_ms,
            text: self.text.clone(),
        })
    }

    /// 시간 모드 1초 틱. time_update를 내고, 0에 도달하면 강제 종료한다.
    pub fn tick_clock(&mut self) -> Vec<ServerMessage> {
        if self.status != RaceStatus::Racing || self.config.mode != RaceMode::Time {
            return Vec::new();
        }
        let Some(remaining) = self.time_remaining else {
            return Vec::new();
        };

        let remaining = remaining.saturating_sub(1);
        self.time_remaining = Some(remaining);

        let mut events = vec![ServerMessage::TimeUpdate {
            time_remaining: remaining,
        }];
        if remaining == 0 {
            ranking::force_finish(&mut self.participants, self.config.time_limit);
            events.push(self.finalize());
        }
        events
    }

    /// 진행률 갱신. 레이스 중이 아니거나 이미 완주했으면 무시(None).
    pub fn record_progress(&mut self, id: &str, progress: f64, wpm: f64) -> Option<ServerMessage> {
        if self.status != RaceStatus::Racing {
            return None;
        }
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id && !p.finished)?;

        participant.progress = participant.progress.max(clamp_progress(progress));
        participant.wpm = clamp_wpm(wpm);

        Some(ServerMessage::ProgressBroadcast {
            participant_id: participant.id.clone(),
            progress: participant.progress,
            wpm: participant.wpm,
        })
    }

    /// 완주 처리. 무시되는 경우 빈 Vec.
    pub fn record_finish(&mut self, id: &str, wpm: f64, now_ms: u64) -> Vec<ServerMessage> {
        if self.status != RaceStatus::Racing {
            return Vec::new();
        }
        let finish_time = now_ms.saturating_sub(self.start_time.unwrap_or(now_ms));
        let mode = self.config.mode;
        let finished_before = self.finish_count;

        let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.id == id && !p.finished)
        else {
            return Vec::new();
        };

        self.finish_count += 1;
        participant.finished = true;
        participant.progress = 100.0;
        participant.wpm = clamp_wpm(wpm);
        participant.finish_time = Some(finish_time);
        // 시간 모드는 종료 시점까지 순위 보류 (0 = 미확정)
        let position = match mode {
            RaceMode::Words => finished_before + 1,
            RaceMode::Time => 0,
        };
        participant.position = Some(position);

        let mut events = vec![ServerMessage::ParticipantFinished {
            participant_id: participant.id.clone(),
            position,
            finish_time,
            wpm: participant.wpm,
        }];
        if self.all_finished() {
            events.push(self.finalize());
        }
        events
    }

    /// 참가자 제거 및 이탈 정책 적용. 로스터에 없으면 None.
    pub fn remove_participant(&mut self, id: &str) -> Option<Departure> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        self.participants.remove(index);

        let was_host = self.host_id == id;
        if self.participants.is_empty() || (was_host && self.status == RaceStatus::Waiting) {
            return Some(Departure::Close);
        }

        let new_host = if was_host {
            self.host_id = self.participants[0].id.clone();
            Some(self.host_id.clone())
        } else {
            None
        };

        let completion = if self.status == RaceStatus::Racing && self.all_finished() {
            Some(self.finalize())
        } else {
            None
        };

        Some(Departure::Stay {
            new_host,
            completion,
        })
    }

    fn all_finished(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.finished)
    }

    /// racing → finished, 최종 순위 산출
    fn finalize(&mut self) -> ServerMessage {
        self.status = RaceStatus::Finished;
        self.time_remaining = None;
        let results = match self.config.mode {
            RaceMode::Words => ranking::rank_by_finish_order(&mut self.participants),
            RaceMode::Time => ranking::rank_by_wpm(&mut self.participants),
        };
        ServerMessage::RaceFinished { results }
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}

fn clamp_wpm(wpm: f64) -> f64 {
    if wpm.is_nan() {
        0.0
    } else {
        wpm.max(0.0)
    }
}
