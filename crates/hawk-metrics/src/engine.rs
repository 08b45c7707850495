//! 메트릭 엔진: 한 번의 새로고침 사이클.
//!
//! 캐시 확인 → 세 조회 동시 실행 → PV/UV/에러율 → 이전 스냅샷 대비 추세
//! → 캐시 저장. 캐시와 이전 스냅샷 슬롯을 소유하므로 호출자는 사이클을
//! 겹쳐 실행하지 않아야 한다 (스케줄러가 `Mutex`로 직렬화).

use chrono::Utc;
use hawk_core::config::AppConfig;
use hawk_core::error::CoreError;
use hawk_core::models::counters::AggregateCounters;
use hawk_core::models::metric::{MetricCard, MetricId, MetricSnapshot};
use hawk_core::ports::telemetry_source::{TelemetrySource, DEFAULT_FETCH_LIMIT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::{SnapshotCache, DEFAULT_CACHE_TTL};
use crate::extractor::{error_rate, format_count, page_views, unique_visitors, TierCount};
use crate::trend::{calculate_trend, TrendChange};

/// 엔진 설정
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub cache_ttl: Duration,
    pub fetch_limit: usize,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            fetch_limit: config.source.fetch_limit,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

/// 사이클 결과
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub snapshot: Arc<MetricSnapshot>,
    /// 캐시에서 반환됨 (네트워크 조회 없음)
    pub from_cache: bool,
}

/// 사이클 실행기
pub struct MetricsEngine {
    source: Arc<dyn TelemetrySource>,
    cache: SnapshotCache,
    previous: Option<Arc<MetricSnapshot>>,
    fetch_limit: usize,
}

impl MetricsEngine {
    pub fn new(source: Arc<dyn TelemetrySource>, settings: EngineSettings) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(settings.cache_ttl),
            previous: None,
            fetch_limit: settings.fetch_limit,
        }
    }

    /// 현재 벽시계 기준으로 사이클 실행
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CoreError> {
        self.run_cycle_at(Utc::now().timestamp_millis()).await
    }

    /// `now_ms`(Unix 밀리초)를 UV 분 단위 버킷 기준으로 사이클 실행
    pub async fn run_cycle_at(&mut self, now_ms: i64) -> Result<CycleOutcome, CoreError> {
        if let Some(snapshot) = self.cache.get() {
            return Ok(CycleOutcome {
                snapshot,
                from_cache: true,
            });
        }

        let source = self.source.clone();
        let limit = self.fetch_limit;
        let (counters, behaviors, performance) = tokio::try_join!(
            source.fetch_counters(),
            source.fetch_behaviors(limit),
            source.fetch_performance(limit),
        )?;
        debug!(
            "소스 조회 완료: 행동 {}개, 성능 {}개",
            behaviors.len(),
            performance.len()
        );

        let pv = page_views(&behaviors, &performance);
        let uv = unique_visitors(&behaviors, &performance, now_ms);
        let rate = error_rate(&counters);

        let snapshot = Arc::new(self.build_snapshot(&counters, pv, uv, &rate));
        info!(
            "메트릭 계산 완료: UV {} ({:?}), PV {} ({:?}), 이벤트 {}, 에러율 {}%",
            uv.count, uv.tier, pv.count, pv.tier, counters.total, rate
        );

        self.cache.put(snapshot.clone());
        self.previous = Some(snapshot.clone());

        Ok(CycleOutcome {
            snapshot,
            from_cache: false,
        })
    }

    fn previous_value(&self, id: MetricId) -> f64 {
        self.previous
            .as_ref()
            .and_then(|snapshot| snapshot.card(id))
            .map(MetricCard::numeric_value)
            .unwrap_or(0.0)
    }

    fn build_snapshot(
        &self,
        counters: &AggregateCounters,
        pv: TierCount,
        uv: TierCount,
        rate: &str,
    ) -> MetricSnapshot {
        let rate_value = rate.parse::<f64>().unwrap_or(0.0);

        let cards = MetricId::ALL
            .iter()
            .map(|&id| {
                let (value, current) = match id {
                    MetricId::ActiveUsers => (format_count(uv.count as u64), uv.count as f64),
                    MetricId::PageViews => (format_count(pv.count as u64), pv.count as f64),
                    MetricId::TotalEvents => (format_count(counters.total), counters.total as f64),
                    MetricId::ErrorRate => (format!("{rate}%"), rate_value),
                };
                let change = calculate_trend(current, self.previous_value(id));
                card(id, value, change)
            })
            .collect();

        MetricSnapshot::new(cards)
    }

    /// 마지막으로 계산한 스냅샷
    pub fn previous(&self) -> Option<Arc<MetricSnapshot>> {
        self.previous.clone()
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }
}

fn card(id: MetricId, value: String, change: TrendChange) -> MetricCard {
    let (title, description, unit, badge) = match id {
        MetricId::ActiveUsers => ("활성 사용자 수", "독립 방문자 수 (UV)", "UV", "UV"),
        MetricId::PageViews => ("페이지 조회수", "전체 페이지 방문 수 (PV)", "PV", "PV"),
        MetricId::TotalEvents => ("전체 이벤트 수", "모든 모니터링 이벤트 합계", "건", "EV"),
        MetricId::ErrorRate => ("에러율", "에러 이벤트 비율", "%", "ER"),
    };

    MetricCard {
        id,
        title: title.to_string(),
        description: description.to_string(),
        value,
        unit: unit.to_string(),
        badge: badge.to_string(),
        trend: Some(change.trend),
        change: Some(change.change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{behavior, counters, performance, FakeSource};
    use hawk_core::models::metric::Trend;
    use tokio_test::assert_err;

    const NOW: i64 = 1_700_000_000_000;

    fn engine(source: &Arc<FakeSource>) -> MetricsEngine {
        MetricsEngine::new(source.clone(), EngineSettings::default())
    }

    fn value(snapshot: &MetricSnapshot, id: MetricId) -> String {
        snapshot.card(id).unwrap().value.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_builds_four_cards_with_stable_trend() {
        let source = Arc::new(FakeSource::with_data(
            counters(1, 3),
            vec![behavior("load", "u1"), behavior("route_change", "u1")],
            vec![],
        ));
        let mut engine = engine(&source);

        let outcome = engine.run_cycle_at(NOW).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(source.reads(), 3);

        let snapshot = outcome.snapshot;
        let ids: Vec<MetricId> = snapshot.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, MetricId::ALL.to_vec());
        assert_eq!(value(&snapshot, MetricId::ActiveUsers), "1");
        assert_eq!(value(&snapshot, MetricId::PageViews), "2");
        assert_eq!(value(&snapshot, MetricId::TotalEvents), "3");
        assert_eq!(value(&snapshot, MetricId::ErrorRate), "33.3%");
        for card in &snapshot.cards {
            assert_eq!(card.trend, Some(Trend::Stable));
            assert_eq!(card.change.as_deref(), Some("0%"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_within_ttl_reads_nothing() {
        let source = Arc::new(FakeSource::with_data(counters(0, 10), vec![], vec![]));
        let mut engine = engine(&source);

        let first = engine.run_cycle_at(NOW).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = engine.run_cycle_at(NOW).await.unwrap();

        assert!(second.from_cache);
        assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn trend_compares_against_previous_snapshot() {
        let source = Arc::new(FakeSource::with_data(counters(10, 1_000), vec![], vec![]));
        let mut engine = engine(&source);
        engine.run_cycle_at(NOW).await.unwrap();

        source.set_counters(counters(10, 1_100));
        tokio::time::advance(Duration::from_secs(11)).await;
        let snapshot = engine.run_cycle_at(NOW).await.unwrap().snapshot;

        let total = snapshot.card(MetricId::TotalEvents).unwrap();
        assert_eq!(total.value, "1,100");
        assert_eq!(total.trend, Some(Trend::Up));
        assert_eq!(total.change.as_deref(), Some("+10.0%"));

        // 1.0% → 0.9%
        let rate = snapshot.card(MetricId::ErrorRate).unwrap();
        assert_eq!(rate.value, "0.9%");
        assert_eq!(rate.trend, Some(Trend::Down));
        assert_eq!(rate.change.as_deref(), Some("-10.0%"));

        assert_eq!(engine.previous().unwrap(), snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_previous_stays_stable() {
        let source = Arc::new(FakeSource::with_data(counters(0, 0), vec![], vec![]));
        let mut engine = engine(&source);
        engine.run_cycle_at(NOW).await.unwrap();

        source.set_behaviors(vec![behavior("load", "u1")]);
        engine.invalidate_cache();
        let snapshot = engine.run_cycle_at(NOW).await.unwrap().snapshot;

        let pv = snapshot.card(MetricId::PageViews).unwrap();
        assert_eq!(pv.value, "1");
        assert_eq!(pv.trend, Some(Trend::Stable));
        assert_eq!(pv.change.as_deref(), Some("0%"));
    }

    #[tokio::test(start_paused = true)]
    async fn performance_fallback_feeds_cards() {
        let source = Arc::new(FakeSource::with_data(
            counters(0, 2),
            vec![],
            vec![performance("resource", 120_000.0), performance("paint", 600_000.0)],
        ));
        let snapshot = engine(&source).run_cycle_at(NOW).await.unwrap().snapshot;
        assert_eq!(value(&snapshot, MetricId::PageViews), "1");
        assert_eq!(value(&snapshot, MetricId::ActiveUsers), "1");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_keeps_previous_and_cache_empty() {
        let source = Arc::new(FakeSource::with_data(counters(0, 5), vec![], vec![]));
        source.fail_next(1);
        let mut engine = engine(&source);

        let err = assert_err!(engine.run_cycle_at(NOW).await);
        assert!(matches!(
            err,
            CoreError::SourceUnavailable {
                status: Some(500),
                ..
            }
        ));
        assert!(engine.previous().is_none());

        let outcome = engine.run_cycle_at(NOW).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(source.counter_calls(), 2);
    }

    #[test]
    fn settings_from_config() {
        let mut config = AppConfig::default_config();
        config.refresh.cache_ttl_ms = 2_500;
        config.source.fetch_limit = 100;
        let settings = EngineSettings::from_config(&config);
        assert_eq!(settings.cache_ttl, Duration::from_millis(2_500));
        assert_eq!(settings.fetch_limit, 100);
    }
}
