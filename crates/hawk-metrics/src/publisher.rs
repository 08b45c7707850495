//! 대시보드 상태 발행.
//!
//! `tokio::sync::watch` 기반. 구독자는 항상 최신 상태만 본다
//! (중간 상태는 건너뛸 수 있음).

use hawk_core::models::dashboard::DashboardState;
use hawk_core::ports::consumer::MetricsConsumer;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// 관찰 가능한 대시보드 상태
#[derive(Clone)]
pub struct SnapshotPublisher {
    tx: Arc<watch::Sender<DashboardState>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::with_state(DashboardState::default())
    }

    pub fn with_state(initial: DashboardState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// 상태 변경 수신기
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }

    /// 현재 상태 복제본
    pub fn current(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    /// 상태 수정 후 구독자에게 알림
    pub fn update<F>(&self, modify: F)
    where
        F: FnOnce(&mut DashboardState),
    {
        self.tx.send_modify(modify);
    }

    /// 소비자 연결: 현재 상태를 한 번 렌더링한 뒤 변경마다 렌더링
    ///
    /// 발행자가 모두 drop되면 태스크가 종료된다.
    pub fn attach(&self, consumer: Arc<dyn MetricsConsumer>) -> JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            let state = rx.borrow_and_update().clone();
            consumer.render(&state);

            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                consumer.render(&state);
            }
            debug!("상태 발행 종료 - 소비자 분리");
        })
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
