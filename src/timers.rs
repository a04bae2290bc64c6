//! 세션 코드 기준 타이머 레지스트리
//!
//! 세션마다 레이스 구동 태스크(카운트다운 + 시간 모드 시계)를 하나씩 보관한다.
//! 세션 세대(generation)를 함께 기록해, 같은 코드를 재사용한 새 세션의
//! 타이머를 이전 세션 정리 과정에서 잘못 취소하지 않는다.

use dashmap::DashMap;
use tokio::task::JoinHandle;

struct TimerSlot {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct TimerRegistry {
    slots: DashMap<String, TimerSlot>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 타이머 등록. 같은 코드의 기존 타이머는 중단된다.
    pub fn register(&self, code: &str, generation: u64, handle: JoinHandle<()>) {
        if let Some(previous) = self
            .slots
            .insert(code.to_string(), TimerSlot { generation, handle })
        {
            previous.handle.abort();
        }
    }

    /// 해당 세대의 타이머만 취소
    pub fn cancel(&self, code: &str, generation: u64) -> bool {
        match self.slots.remove_if(code, |_, slot| slot.generation == generation) {
            Some((_, slot)) => {
                slot.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.slots.retain(|code, slot| {
            slot.handle.abort();
            tracing::debug!(race_id = %code, "Timer cancelled");
            false
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
