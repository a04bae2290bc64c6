//! 레이스 도메인: 식별자, 텍스트, 순위, 세션 상태 머신

pub mod ids;
pub mod ranking;
pub mod session;
pub mod text;

pub use session::{validate_config, validate_name, Departure, Session};
pub use text::{TextSampler, WordListSampler};
