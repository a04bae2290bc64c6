//! 클라이언트-서버 메시지 프로토콜 정의
//!
//! 모든 메시지는 `type` 태그를 가진 평탄한 JSON 레코드이며 필드는 camelCase.

use serde::{Deserialize, Serialize};

/// 레이스 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceMode {
    Words,
    Time,
}

/// 세션 상태 (waiting → countdown → racing → finished)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Waiting,
    Countdown,
    Racing,
    Finished,
}

/// 레이스 설정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaceConfig {
    pub mode: RaceMode,
    pub word_count: u32,
    pub time_limit: u32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            mode: RaceMode::Words,
            word_count: 30,
            time_limit: 60,
        }
    }
}

/// 참가자 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub progress: f64,
    pub wpm: f64,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub finish_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<u32>,
}

impl Participant {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            progress: 0.0,
            wpm: 0.0,
            finished: false,
            finish_time: None,
            position: None,
        }
    }
}

/// 세션 전체 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceState {
    pub race_id: String,
    pub status: RaceStatus,
    pub participants: Vec<Participant>,
    pub text: Vec<String>,
    pub countdown_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<u64>,
    pub host_id: String,
    pub config: RaceConfig,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_remaining: Option<u32>,
}

/// 클라이언트 → 서버 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRace {
        #[serde(default)]
        name: String,
        #[serde(default)]
        config: Option<RaceConfig>,
    },
    JoinRace {
        #[serde(default)]
        race_id: String,
        #[serde(default)]
        name: String,
    },
    UpdateConfig {
        config: RaceConfig,
    },
    StartRace,
    ProgressUpdate {
        progress: f64,
        wpm: f64,
    },
    FinishRace {
        wpm: f64,
    },
    LeaveRace,
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RaceCreated {
        race_id: String,
        participant: Participant,
    },
    RaceJoined {
        race_state: RaceState,
        participant_id: String,
    },
    ParticipantJoined {
        participant: Participant,
    },
    ParticipantLeft {
        participant_id: String,
    },
    ConfigUpdated {
        config: RaceConfig,
    },
    CountdownStart {
        countdown_seconds: u32,
    },
    RaceStart {
        start_time: u64,
        text: Vec<String>,
    },
    TimeUpdate {
        time_remaining: u32,
    },
    ProgressBroadcast {
        participant_id: String,
        progress: f64,
        wpm: f64,
    },
    ParticipantFinished {
        participant_id: String,
        position: u32,
        finish_time: u64,
        wpm: f64,
    },
    RaceFinished {
        results: Vec<Participant>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// 로그용 태그 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RaceCreated { .. } => "race_created",
            Self::RaceJoined { .. } => "race_joined",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::CountdownStart { .. } => "countdown_start",
            Self::RaceStart { .. } => "race_start",
            Self::TimeUpdate { .. } => "time_update",
            Self::ProgressBroadcast { .. } => "progress_broadcast",
            Self::ParticipantFinished { .. } => "participant_finished",
            Self::RaceFinished { .. } => "race_finished",
            Self::Error { .. } => "error",
        }
    }
}
