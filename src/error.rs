//! 레이스 도메인 에러
//!
//! `Display` 문자열이 그대로 클라이언트의 `error` 이벤트 메시지가 된다.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    #[error("{0}")]
    InvalidName(&'static str),

    #[error("Race not found")]
    NotFound,

    #[error("Race has already started")]
    AlreadyStarted,

    #[error("Cannot change settings after race has started")]
    SettingsLocked,

    #[error("Race is full (max {max} players)")]
    Full { max: usize },

    #[error("Username already taken in this race")]
    NameTaken,

    #[error("Only the host can {action}")]
    NotHost { action: &'static str },

    #[error("Invalid race settings: {0}")]
    InvalidConfig(String),

    #[error("You are not in a race")]
    NotInRace,
}

pub type RaceResult<T> = Result<T, RaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(RaceError::NotFound.to_string(), "Race not found");
        assert_eq!(
            RaceError::Full { max: 8 }.to_string(),
            "Race is full (max 8 players)"
        );
        assert_eq!(
            RaceError::NotHost {
                action: "start the race"
            }
            .to_string(),
            "Only the host can start the race"
        );
        assert_eq!(
            RaceError::SettingsLocked.to_string(),
            "Cannot change settings after race has started"
        );
        assert_eq!(
            RaceError::InvalidName("Please enter a username").to_string(),
            "Please enter a username"
        );
    }
}
