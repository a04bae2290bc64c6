//! 레이스 텍스트 생성

use crate::protocol::{RaceConfig, RaceMode};
use rand::seq::SliceRandom;

/// 시간 모드에서 최소 단어 수
pub const TIME_MODE_MIN_WORDS: usize = 100;
/// 시간 모드 초당 단어 수 상한 추정
pub const TIME_MODE_WORDS_PER_SECOND: usize = 3;

#[rustfmt::skip]
const WORD_LIST: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "I",
    "it", "for", "not", "on", "with", "he", "as", "you", "do", "at",
    "this", "but", "his", "by", "from", "they", "we", "say", "her", "she",
    "or", "an", "will", "my", "one", "all", "would", "there", "their", "what",
    "so", "up", "out", "if", "about", "who", "get", "which", "go", "me",
    "when", "make", "can", "like", "time", "no", "just", "him", "know", "take",
    "people", "into", "year", "your", "good", "some", "could", "them", "see", "other",
    "than", "then", "now", "look", "only", "come", "its", "over", "think", "also",
    "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
    "even", "new", "want", "because", "any", "these", "give", "day", "most", "us",
];

/// 레이스 텍스트를 만드는 외부 협력자
pub trait TextSampler: Send + Sync {
    fn sample(&self, count: usize) -> Vec<String>;
}

/// 내장 단어 목록에서 복원 추출
#[derive(Debug, Default, Clone, Copy)]
pub struct WordListSampler;

impl TextSampler for WordListSampler {
    fn sample(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        (0..count)
            .filter_map(|_| WORD_LIST.choose(&mut rng))
            .map(|w| w.to_string())
            .collect()
    }
}

/// 설정에 맞는 단어 수
pub fn words_for(config: &RaceConfig) -> usize {
    match config.mode {
        RaceMode::Words => config.word_count as usize,
        RaceMode::Time => {
            TIME_MODE_MIN_WORDS.max(config.time_limit as usize * TIME_MODE_WORDS_PER_SECOND)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_mode_uses_word_count() {
        let config = RaceConfig {
            mode: RaceMode::Words,
            word_count: 50,
            time_limit: 60,
        };
        assert_eq!(words_for(&config), 50);
    }

    #[test]
    fn time_mode_has_generous_floor() {
        let short = RaceConfig {
            mode: RaceMode::Time,
            word_count: 10,
            time_limit: 30,
        };
        assert_eq!(words_for(&short), 100);

        let long = RaceConfig {
            mode: RaceMode::Time,
            word_count: 10,
            time_limit: 120,
        };
        assert_eq!(words_for(&long), 360);
    }

    #[test]
    fn sampler_draws_from_word_list() {
        let words = WordListSampler.sample(250);
        assert_eq!(words.len(), 250);
        assert!(words.iter().all(|w| WORD_LIST.contains(&w.as_str())));
    }
}
