//! 새로고침 흐름 통합 테스트.
//!
//! mock 서버 → HttpTelemetrySource → MetricsEngine/RefreshScheduler → DashboardState


use hawk_core::models::dashboard::{DashboardState, RefreshPhase};
use hawk_core::models::metric::{MetricId, MetricSnapshot, Trend};
use hawk_metrics::engine::{EngineSettings, MetricsEngine};
use hawk_metrics::publisher::SnapshotPublisher;
use hawk_metrics::retry::RetryPolicy;
use hawk_metrics::scheduler::{RefreshScheduler, SchedulerConfig, SchedulerHandle};
use hawk_network::connectivity::ConnectivityManager;
use hawk_network::http_client::HttpTelemetrySource;
use mock_server::{behavior, performance, MockServer, Visible};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const NOW: i64 = 1_700_000_000_000;

fn engine_for(server: &MockServer, cache_ttl: Duration) -> MetricsEngine {
    let source = HttpTelemetrySource::new(server.url(), Duration::from_secs(5)).unwrap();
    MetricsEngine::new(
        Arc::new(source),
        EngineSettings {
            cache_ttl,
            fetch_limit: 100,
        },
    )
}

fn value(snapshot: &MetricSnapshot, id: MetricId) -> &str {
    &snapshot.card(id).unwrap().value
}

struct Running {
    publisher: SnapshotPublisher,
    handle: SchedulerHandle,
    connectivity: Arc<ConnectivityManager>,
    foreground: Arc<Visible>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Running {
    fn start(server: &MockServer, retry: RetryPolicy, force_offline: bool) -> Self {
        let connectivity = Arc::new(ConnectivityManager::default());
        connectivity.set_force_offline(force_offline);
        let foreground = Arc::new(Visible::new());
        let publisher = SnapshotPublisher::new();
        let (scheduler, handle) = RefreshScheduler::new(
            SchedulerConfig {
                refresh_interval: Duration::from_secs(60),
                retry,
            },
            engine_for(server, Duration::from_millis(50)),
            publisher.clone(),
            connectivity.clone(),
            foreground.clone(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(scheduler.run(shutdown_rx));
        Self {
            publisher,
            handle,
            connectivity,
            foreground,
            shutdown_tx,
            task,
        }
    }

    async fn wait_for(&self, predicate: impl FnMut(&DashboardState) -> bool) -> DashboardState {
        let mut rx = self.publisher.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("상태 대기 타임아웃")
            .expect("발행자 종료");
        state.clone()
    }

    async fn stop(self) {
        self.shutdown_tx.send(true).unwrap();
        self.task.await.unwrap();
    }
}

#[tokio::test]
async fn engine_computes_snapshot_from_server() {
    let server = MockServer::start().await;
    server.set_counters(2, 40);
    server.push_behavior(behavior("load", "u1"));
    server.push_behavior(behavior("load", "u2"));
    server.push_behavior(behavior("route_change", "u1"));
    server.push_behavior(behavior("click", "u3"));

    let mut engine = engine_for(&server, Duration::from_secs(10));
    let outcome = engine.run_cycle_at(NOW).await.unwrap();

    assert!(!outcome.from_cache);
    let snapshot = outcome.snapshot;
    assert_eq!(value(&snapshot, MetricId::ActiveUsers), "2");
    assert_eq!(value(&snapshot, MetricId::PageViews), "3");
    assert_eq!(value(&snapshot, MetricId::TotalEvents), "40");
    assert_eq!(value(&snapshot, MetricId::ErrorRate), "5.0%");
    assert_eq!(server.stats_count(), 1);
    assert_eq!(server.request_count(), 3);
    assert_eq!(server.last_limit(), Some(100));
}

#[tokio::test]
async fn engine_serves_cache_within_ttl() {
    let server = MockServer::start().await;
    server.set_counters(0, 5);

    let mut engine = engine_for(&server, Duration::from_secs(10));
    let first = engine.run_cycle_at(NOW).await.unwrap();
    let second = engine.run_cycle_at(NOW).await.unwrap();

    assert!(second.from_cache);
    assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn engine_falls_back_to_performance_records() {
    let server = MockServer::start().await;
    server.set_counters(0, 2);
    server.push_performance(performance("navigation", NOW));
    server.push_performance(performance("resource", NOW + 1_000));

    let mut engine = engine_for(&server, Duration::from_secs(10));
    let snapshot = engine.run_cycle_at(NOW).await.unwrap().snapshot;

    assert_eq!(value(&snapshot, MetricId::PageViews), "2");
    // 식별자 없는 두 레코드가 같은 1분 윈도우에 속함
    assert_eq!(value(&snapshot, MetricId::ActiveUsers), "1");
}

#[tokio::test]
async fn engine_reports_trend_after_ttl() {
    let server = MockServer::start().await;
    server.set_counters(0, 100);

    let mut engine = engine_for(&server, Duration::from_millis(20));
    engine.run_cycle_at(NOW).await.unwrap();

    server.set_counters(0, 150);
    tokio::time::sleep(Duration::from_millis(40)).await;
    let outcome = engine.run_cycle_at(NOW).await.unwrap();

    assert!(!outcome.from_cache);
    let total = outcome.snapshot.card(MetricId::TotalEvents).unwrap().clone();
    assert_eq!(total.value, "150");
    assert_eq!(total.trend, Some(Trend::Up));
    assert_eq!(total.change.as_deref(), Some("+50.0%"));
}

#[tokio::test]
async fn scheduler_publishes_initial_snapshot() {
    let server = MockServer::start().await;
    server.set_counters(1, 10);
    server.push_behavior(behavior("load", "u1"));

    let running = Running::start(&server, RetryPolicy::default(), false);
    let state = running.wait_for(|s| s.snapshot.is_some()).await;

    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(state.last_update.is_some());
    assert_eq!(state.phase, RefreshPhase::Idle);
    let snapshot = state.snapshot.unwrap();
    assert_eq!(value(&snapshot, MetricId::ErrorRate), "10.0%");

    running.stop().await;
}

#[tokio::test]
async fn scheduler_retries_then_recovers() {
    let server = MockServer::start().await;
    server.set_counters(0, 7);
    server.fail_next(1);

    let retry = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(300),
    };
    let running = Running::start(&server, retry, false);

    let failed = running
        .wait_for(|s| s.error.is_some() && s.retry_attempt == 1)
        .await;
    assert_eq!(failed.phase, RefreshPhase::RetryPending);
    assert!(failed.error.unwrap().contains("500"));

    let recovered = running
        .wait_for(|s| s.snapshot.is_some() && s.error.is_none() && !s.loading)
        .await;
    assert_eq!(recovered.retry_attempt, 0);
    assert_eq!(value(recovered.snapshot.as_ref().unwrap(), MetricId::TotalEvents), "7");
    assert_eq!(server.stats_count(), 2);

    running.stop().await;
}

#[tokio::test]
async fn scheduler_manual_refresh_after_retries_exhausted() {
    let server = MockServer::start().await;
    server.set_counters(0, 3);
    server.fail_next(1);

    // 한 번 실패하면 자동 재시도 한도 도달
    let retry = RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(50),
    };
    let running = Running::start(&server, retry, false);

    let exhausted = running
        .wait_for(|s| s.error.is_some() && s.phase == RefreshPhase::Idle)
        .await;
    assert_eq!(exhausted.retry_attempt, 1);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(server.stats_count(), 1);

    running.handle.refresh().unwrap();
    let recovered = running
        .wait_for(|s| s.snapshot.is_some() && s.error.is_none() && !s.loading)
        .await;
    assert_eq!(recovered.retry_attempt, 0);
    assert_eq!(server.stats_count(), 2);

    running.stop().await;
}

#[tokio::test]
async fn scheduler_waits_for_connectivity() {
    let server = MockServer::start().await;
    server.set_counters(0, 9);

    let running = Running::start(&server, RetryPolicy::default(), true);

    let offline = running
        .wait_for(|s| !s.is_online && s.error.is_some())
        .await;
    assert!(offline.error.unwrap().contains("오프라인"));
    assert!(offline.snapshot.is_none());
    assert_eq!(server.request_count(), 0);

    running.connectivity.set_force_offline(false);
    let online = running
        .wait_for(|s| s.is_online && s.snapshot.is_some() && !s.loading)
        .await;
    assert!(online.error.is_none());
    assert_eq!(server.stats_count(), 1);

    running.stop().await;
}

#[tokio::test]
async fn scheduler_refreshes_on_foreground_regain() {
    let server = MockServer::start().await;
    server.set_counters(0, 1);

    let running = Running::start(&server, RetryPolicy::default(), false);
    running
        .wait_for(|s| s.snapshot.is_some() && !s.loading)
        .await;
    assert_eq!(server.stats_count(), 1);

    server.set_counters(0, 2);
    running.foreground.set(false);
    // 캐시 TTL(50ms) 경과 후 복귀
    tokio::time::sleep(Duration::from_millis(100)).await;
    running.foreground.set(true);

    let refreshed = running
        .wait_for(|s| {
            s.snapshot
                .as_ref()
                .is_some_and(|snap| value(snap, MetricId::TotalEvents) == "2")
        })
        .await;
    assert!(refreshed.error.is_none());
    assert_eq!(server.stats_count(), 2);

    running.stop().await;
}
