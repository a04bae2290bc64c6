//! 순위 계산
//!
//! 단어 모드는 완주 순서, 시간 모드는 WPM 기준으로 최종 순위를 매긴다.
//! 로스터 자체의 순서(참가 순서)는 건드리지 않고 `position`만 기록하며,
//! 정렬된 결과 사본을 돌려준다.

use crate::protocol::Participant;
use std::cmp::Ordering;

/// 시간 모드 비교: WPM 내림차순 → 진행률 내림차순 → 완주 시간 오름차순.
/// 정렬은 안정 정렬이므로 모두 같으면 로스터 순서가 유지된다.
pub fn compare_by_wpm(a: &Participant, b: &Participant) -> Ordering {
    b.wpm
        .total_cmp(&a.wpm)
        .then_with(|| b.progress.total_cmp(&a.progress))
        .then_with(|| {
            a.finish_time
                .unwrap_or(u64::MAX)
                .cmp(&b.finish_time.unwrap_or(u64::MAX))
        })
}

/// 단어 모드 최종 순위: 기록된 완주 순서대로 1..N 재부여.
/// 임시 순위는 이탈자까지 센 완주 순번이라 서로 겹치지 않는다.
pub fn rank_by_finish_order(roster: &mut [Participant]) -> Vec<Participant> {
    assign_positions(roster, |a, b| {
        a.position
            .unwrap_or(u32::MAX)
            .cmp(&b.position.unwrap_or(u32::MAX))
    })
}

/// 시간 모드 최종 순위
pub fn rank_by_wpm(roster: &mut [Participant]) -> Vec<Participant> {
    assign_positions(roster, compare_by_wpm)
}

/// 시간 초과 시 미완주자를 강제 완주 처리
pub fn force_finish(roster: &mut [Participant], time_limit_secs: u32) {
    let limit_ms = u64::from(time_limit_secs) * 1000;
    for p in roster.iter_mut().filter(|p| !p.finished) {
        p.finished = true;
        p.finish_time = Some(limit_ms);
    }
}

fn assign_positions<F>(roster: &mut [Participant], compare: F) -> Vec<Participant>
where
    F: Fn(&Participant, &Participant) -> Ordering,
{
    let mut order: Vec<usize> = (0..roster.len()).collect();
    order.sort_by(|&a, &b| compare(&roster[a], &roster[b]));

    for (rank, &idx) in order.iter().enumerate() {
        roster[idx].position = Some(rank as u32 + 1);
    }

    order.into_iter().map(|idx| roster[idx].clone()).collect()
}
