//! TypeRace 릴레이 서버
//!
//! 멀티플레이어 타자 레이스 세션 코디네이터: 세션 레지스트리, 상태 머신,
//! 순위 계산, 브로드캐스트 라우터, 연결 수명 관리.

pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod race;
pub mod server;
pub mod state;
pub mod timers;
