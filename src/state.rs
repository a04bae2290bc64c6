//! 애플리케이션 상태 관리

use crate::config::Config;
use crate::race::{Session, TextSampler, WordListSampler};
use crate::timers::TimerRegistry;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc::UnboundedSender, watch, RwLock};

/// 연결별 송신 채널 (직렬화된 JSON 텍스트)
pub type OutboundSender = UnboundedSender<String>;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 세션 정보 (race_id -> SessionEntry)
    pub sessions: DashMap<String, SessionEntry>,
    /// 피어 세션 (peer_id -> PeerSession)
    pub peers: DashMap<String, PeerSession>,
    /// 세션별 레이스 타이머
    pub timers: TimerRegistry,
    /// 레이스 텍스트 생성기
    pub sampler: Arc<dyn TextSampler>,
    /// 설정
    pub config: Arc<Config>,
    next_generation: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_sampler(config, Arc::new(WordListSampler))
    }

    pub fn with_sampler(config: Config, sampler: Arc<dyn TextSampler>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            sessions: DashMap::new(),
            peers: DashMap::new(),
            timers: TimerRegistry::new(),
            sampler,
            config: Arc::new(config),
            next_generation: AtomicU64::new(1),
            shutdown,
        }
    }

    /// 세션마다 고유한 세대 번호
    pub fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// 살아 있는 같은 세대의 세션 엔트리
    pub fn live_entry(&self, race_id: &str, generation: u64) -> Option<RefMut<'_, String, SessionEntry>> {
        self.sessions
            .get_mut(race_id)
            .filter(|entry| entry.generation == generation)
    }

    pub fn is_live(&self, race_id: &str, generation: u64) -> bool {
        self.sessions
            .get(race_id)
            .map(|entry| entry.generation == generation)
            .unwrap_or(false)
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// 종료 처리: 타이머 중단, 세션 폐기, 모든 연결에 종료 신호
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.timers.cancel_all();
        let sessions = self.sessions.len();
        self.sessions.clear();
        tracing::info!(
            sessions = sessions,
            connections = self.peers.len(),
            "Registry torn down"
        );
    }
}

/// 세션 엔트리: 상태 머신 + 연결 목록
pub struct SessionEntry {
    pub session: Session,
    pub generation: u64,
    /// participant_id -> Connection
    pub connections: HashMap<String, Connection>,
    pub created_at: Instant,
}

impl SessionEntry {
    pub fn new(session: Session, generation: u64) -> Self {
        Self {
            session,
            generation,
            connections: HashMap::new(),
            created_at: Instant::now(),
        }
    }
}

/// 세션에 바인딩된 물리 연결
#[derive(Clone)]
pub struct Connection {
    pub peer_id: String,
    pub sender: OutboundSender,
}

/// 연결이 속한 (세션, 참가자)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub race_id: String,
    pub participant_id: String,
}

/// 피어 세션 정보
pub struct PeerSession {
    pub id: String,
    pub binding: RwLock<Option<Binding>>,
    pub sender: OutboundSender,
    pub connected_at: Instant,
}
