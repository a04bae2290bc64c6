//! 환경 변수 기반 설정 관리

use std::env;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub race: RaceSettings,
    pub log_level: String,
}

/// 레이스 설정
#[derive(Debug, Clone)]
pub struct RaceSettings {
    /// 세션당 최대 참가자 수
    pub max_participants: usize,
    /// 시작 전 카운트다운 (초)
    pub countdown_seconds: u32,
    /// race_finished 이후 결과 보존 시간 (초)
    pub results_retention_secs: u64,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            max_participants: 8,
            countdown_seconds: 3,
            results_retention_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 구성 (파싱 실패 시 기본값)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RaceSettings::default();

        Self {
            port: lookup("WS_PORT")
                .or_else(|| lookup("PORT"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3001),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            race: RaceSettings {
                max_participants: lookup("MAX_PARTICIPANTS")
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(defaults.max_participants),
                countdown_seconds: lookup("COUNTDOWN_SECONDS")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.countdown_seconds),
                results_retention_secs: lookup("RESULTS_RETENTION_SECS")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.results_retention_secs),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// 모든 origin 허용 여부
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, 3001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.race.max_participants, 8);
        assert_eq!(config.race.countdown_seconds, 3);
        assert_eq!(config.race.results_retention_secs, 60);
        assert_eq!(config.log_level, "info");
        assert!(config.allows_any_origin());
    }

    #[test]
    fn ws_port_wins_over_port() {
        let config = Config::from_lookup(lookup_from(&[("WS_PORT", "4100"), ("PORT", "4200")]));
        assert_eq!(config.port, 4100);

        let config = Config::from_lookup(lookup_from(&[("PORT", "4200")]));
        assert_eq!(config.port, 4200);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("WS_PORT", "not-a-port"),
            ("MAX_PARTICIPANTS", "0"),
            ("COUNTDOWN_SECONDS", "-1"),
        ]));
        assert_eq!(config.port, 3001);
        assert_eq!(config.race.max_participants, 8);
        assert_eq!(config.race.countdown_seconds, 3);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "CORS_ORIGINS",
            "http://localhost:3000, https://race.example.com,",
        )]));
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://race.example.com"]
        );
        assert!(!config.allows_any_origin());
    }
}
