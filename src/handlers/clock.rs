//! 서버 주도 타이머: 카운트다운, 시간 모드 시계, 결과 보존 후 삭제
//!
//! 모든 틱은 레지스트리에서 세션을 다시 조회하고 세대를 확인한 뒤에만
//! 상태를 바꾼다. 삭제된 세션이나 코드를 재사용한 새 세션은 건드리지 않는다.

use crate::handlers::broadcast::broadcast;
use crate::handlers::race::{close_session, now_millis};
use crate::protocol::{RaceMode, RaceStatus};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// 레이스 구동 태스크 시작 후 타이머 레지스트리에 등록
pub fn spawn_race_driver(
    state: Arc<AppState>,
    race_id: String,
    generation: u64,
    countdown_seconds: u32,
) {
    let handle = tokio::spawn(run_race(
        state.clone(),
        race_id.clone(),
        generation,
        countdown_seconds,
    ));
    state.timers.register(&race_id, generation, handle);
}

async fn run_race(state: Arc<AppState>, race_id: String, generation: u64, countdown_seconds: u32) {
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // 첫 틱은 즉시 완료된다
    ticker.tick().await;

    for remaining in (0..countdown_seconds).rev() {
        ticker.tick().await;
        if !state.is_live(&race_id, generation) {
            tracing::debug!(race_id = %race_id, "Countdown stopped, race gone");
            return;
        }
        tracing::debug!(race_id = %race_id, remaining = remaining, "Countdown tick");
    }

    let timed = {
        let Some(mut entry) = state.live_entry(&race_id, generation) else {
            return;
        };
        let Some(event) = entry.session.begin_racing(now_millis()) else {
            return;
        };
        broadcast(&entry, &event, None);
        tracing::info!(
            race_id = %race_id,
            mode = ?entry.session.config().mode,
            racers = entry.session.participants().len(),
            "Race started"
        );
        entry.session.config().mode == RaceMode::Time
    };

    if timed {
        run_race_clock(&state, &race_id, generation, &mut ticker).await;
    }
}

/// 시간 모드 시계: 매초 time_update, 0이면 강제 종료
async fn run_race_clock(
    state: &Arc<AppState>,
    race_id: &str,
    generation: u64,
    ticker: &mut tokio::time::Interval,
) {
    loop {
        ticker.tick().await;

        let finished = {
            let Some(mut entry) = state.live_entry(race_id, generation) else {
                return;
            };
            // 전원 완주로 이미 끝난 경우
            if entry.session.status() != RaceStatus::Racing {
                return;
            }
            let events = entry.session.tick_clock();
            for event in &events {
                broadcast(&entry, event, None);
            }
            entry.session.status() == RaceStatus::Finished
        };

        if finished {
            tracing::info!(race_id = %race_id, "Race finished (time limit reached)");
            schedule_retention(state.clone(), race_id.to_string(), generation);
            return;
        }
    }
}

/// race_finished 이후 보존 시간이 지나면 세션 삭제
pub fn schedule_retention(state: Arc<AppState>, race_id: String, generation: u64) {
    let retention = Duration::from_secs(state.config.race.results_retention_secs);
    tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        close_session(&state, &race_id, generation, None).await;
    });
}
