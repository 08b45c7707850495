//! 단위 테스트용 가짜 소스/관찰자.

use async_trait::async_trait;
use hawk_core::error::CoreError;
use hawk_core::models::counters::AggregateCounters;
use hawk_core::models::record::{RawRecord, RecordCategory, SubType, SubTypeDetail};
use hawk_core::ports::environment::{ConnectivityObserver, ForegroundObserver};
use hawk_core::ports::telemetry_source::TelemetrySource;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
struct FakeState {
    counters: AggregateCounters,
    behaviors: Vec<RawRecord>,
    performance: Vec<RawRecord>,
    failures_left: u32,
    delay: Option<Duration>,
}

/// 메모리 텔레메트리 소스
#[derive(Default)]
pub(crate) struct FakeSource {
    state: Mutex<FakeState>,
    counter_calls: AtomicUsize,
    record_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_data(
        counters: AggregateCounters,
        behaviors: Vec<RawRecord>,
        performance: Vec<RawRecord>,
    ) -> Self {
        let source = Self::default();
        {
            let mut state = source.state.lock().unwrap();
            state.counters = counters;
            state.behaviors = behaviors;
            state.performance = performance;
        }
        source
    }

    pub fn set_counters(&self, counters: AggregateCounters) {
        self.state.lock().unwrap().counters = counters;
    }

    pub fn set_behaviors(&self, behaviors: Vec<RawRecord>) {
        self.state.lock().unwrap().behaviors = behaviors;
    }

    /// 다음 `n`번의 카운터 조회를 500으로 실패시킨다
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().failures_left = n;
    }

    /// 카운터 조회 지연
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn counter_calls(&self) -> usize {
        self.counter_calls.load(Ordering::SeqCst)
    }

    /// 세 조회 호출 합계
    pub fn reads(&self) -> usize {
        self.counter_calls() + self.record_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for FakeSource {
    async fn fetch_counters(&self) -> Result<AggregateCounters, CoreError> {
        self.counter_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(CoreError::SourceUnavailable {
                status: Some(500),
                status_text: "Internal Server Error".to_string(),
            });
        }
        Ok(state.counters)
    }

    async fn fetch_behaviors(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.behaviors.iter().take(limit).cloned().collect())
    }

    async fn fetch_performance(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.performance.iter().take(limit).cloned().collect())
    }
}

/// 수동으로 토글하는 환경 신호 (연결/포그라운드 공용)
pub(crate) struct Switch {
    tx: watch::Sender<bool>,
}

impl Switch {
    pub fn new(initial: bool) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, value: bool) {
        self.tx.send_replace(value);
    }
}

impl ConnectivityObserver for Switch {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl ForegroundObserver for Switch {
    fn is_foreground(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

pub(crate) fn counters(errors: u64, total: u64) -> AggregateCounters {
    AggregateCounters {
        errors,
        total,
        ..Default::default()
    }
}

pub(crate) fn behavior(tag: &str, user: &str) -> RawRecord {
    RawRecord {
        category: RecordCategory::Behavior,
        sub_type: Some(SubType::Tag(tag.to_string())),
        data: Some(json!({ "userUuid": user })),
        ..Default::default()
    }
}

pub(crate) fn performance(kind: &str, ts: f64) -> RawRecord {
    RawRecord {
        category: RecordCategory::Performance,
        sub_type: Some(SubType::Detail(SubTypeDetail {
            kind: kind.to_string(),
            ..Default::default()
        })),
        timestamp: Some(ts),
        ..Default::default()
    }
}
