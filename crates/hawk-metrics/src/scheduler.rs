//! 새로고침 스케줄러.
//!
//! 단일 태스크가 주기 타이머, 포그라운드 복귀, 연결 복구, 수동 새로고침,
//! 재시도 타이머를 받아 한 번에 하나의 사이클만 실행한다.
//!
//! 상태: `Idle` → `Fetching` → (`Idle` | `RetryPending` → `Fetching`)

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use hawk_core::config::AppConfig;
use hawk_core::error::CoreError;
use hawk_core::models::dashboard::RefreshPhase;
use hawk_core::ports::environment::{ConnectivityObserver, ForegroundObserver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{CycleOutcome, MetricsEngine};
use crate::publisher::SnapshotPublisher;
use crate::retry::{RetryPolicy, RetryState};

/// 스케줄러 설정
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// 자동 새로고침 주기
    pub refresh_interval: Duration,
    pub retry: RetryPolicy,
}

impl SchedulerConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// 스케줄러 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// 수동 새로고침
    Refresh,
    /// 자동 새로고침 주기 변경
    SetInterval(Duration),
}

/// 사이클을 시작시키는 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Initial,
    Timer,
    Foreground,
    Reconnect,
    Retry,
    Manual,
}

/// 실행 중인 스케줄러에 명령을 보내는 핸들
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// 수동 새로고침 요청
    pub fn refresh(&self) -> Result<(), CoreError> {
        self.send(SchedulerCommand::Refresh)
    }

    /// 자동 새로고침 주기 변경
    pub fn set_refresh_interval(&self, interval: Duration) -> Result<(), CoreError> {
        if interval.is_zero() {
            return Err(CoreError::Validation {
                field: "refresh.interval_ms".to_string(),
                message: "0보다 커야 합니다".to_string(),
            });
        }
        self.send(SchedulerCommand::SetInterval(interval))
    }

    fn send(&self, command: SchedulerCommand) -> Result<(), CoreError> {
        self.tx
            .send(command)
            .map_err(|_| CoreError::Internal("스케줄러가 종료되었습니다".to_string()))
    }
}

type CycleFuture = BoxFuture<'static, Result<CycleOutcome, CoreError>>;

/// 새로고침 스케줄러
pub struct RefreshScheduler {
    config: SchedulerConfig,
    engine: Arc<Mutex<MetricsEngine>>,
    publisher: SnapshotPublisher,
    connectivity: Arc<dyn ConnectivityObserver>,
    foreground: Arc<dyn ForegroundObserver>,
    commands_rx: mpsc::UnboundedReceiver<SchedulerCommand>,
}

impl RefreshScheduler {
    /// 스케줄러와 명령 핸들 생성
    pub fn new(
        config: SchedulerConfig,
        engine: MetricsEngine,
        publisher: SnapshotPublisher,
        connectivity: Arc<dyn ConnectivityObserver>,
        foreground: Arc<dyn ForegroundObserver>,
    ) -> (Self, SchedulerHandle) {
        let (tx, commands_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            publisher,
            connectivity,
            foreground,
            commands_rx,
        };
        (scheduler, SchedulerHandle { tx })
    }

    /// 종료 신호까지 실행
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let Self {
            config,
            engine,
            publisher,
            connectivity,
            foreground,
            mut commands_rx,
        } = self;

        info!(
            "새로고침 스케줄러 시작: 주기 {}ms, 최대 재시도 {}회",
            config.refresh_interval.as_millis(),
            config.retry.max_retries
        );

        let mut online_rx = connectivity.subscribe();
        let mut foreground_rx = foreground.subscribe();
        let mut online_open = true;
        let mut foreground_open = true;
        let mut commands_open = true;

        let mut ticker = new_ticker(config.refresh_interval);
        let mut driver = CycleDriver {
            engine,
            publisher,
            online: connectivity.is_online(),
            retry: RetryState::new(config.retry),
            phase: RefreshPhase::Idle,
            in_flight: None,
            retry_at: None,
        };
        driver.publisher.update(|s| s.is_online = driver.online);
        driver.trigger(Trigger::Initial);

        loop {
            let retry_at = driver.retry_at;

            tokio::select! {
                result = await_cycle(&mut driver.in_flight) => {
                    driver.finish_cycle(result);
                }
                _ = sleep_until(retry_at.unwrap_or_else(far_future)), if retry_at.is_some() => {
                    driver.retry_at = None;
                    driver.trigger(Trigger::Retry);
                }
                _ = ticker.tick() => {
                    driver.trigger(Trigger::Timer);
                }
                changed = online_rx.changed(), if online_open => {
                    if changed.is_err() {
                        online_open = false;
                        continue;
                    }
                    let online = *online_rx.borrow_and_update();
                    driver.set_online(online);
                }
                changed = foreground_rx.changed(), if foreground_open => {
                    if changed.is_err() {
                        foreground_open = false;
                        continue;
                    }
                    let visible = *foreground_rx.borrow_and_update();
                    if visible && driver.online {
                        driver.trigger(Trigger::Foreground);
                    }
                }
                command = commands_rx.recv(), if commands_open => {
                    match command {
                        Some(SchedulerCommand::Refresh) => driver.trigger(Trigger::Manual),
                        Some(SchedulerCommand::SetInterval(interval)) => {
                            info!("새로고침 주기 변경: {}ms", interval.as_millis());
                            ticker = new_ticker(interval);
                        }
                        None => commands_open = false,
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("새로고침 스케줄러 종료");
    }
}

/// 루프 안에서만 쓰는 사이클 상태
struct CycleDriver {
    engine: Arc<Mutex<MetricsEngine>>,
    publisher: SnapshotPublisher,
    online: bool,
    retry: RetryState,
    phase: RefreshPhase,
    in_flight: Option<CycleFuture>,
    retry_at: Option<Instant>,
}

impl CycleDriver {
    fn trigger(&mut self, trigger: Trigger) {
        match (self.phase, trigger) {
            (RefreshPhase::Fetching, _) => {
                debug!("{trigger:?} 무시: 사이클 진행 중");
                return;
            }
            (RefreshPhase::RetryPending, Trigger::Retry) => {}
            (RefreshPhase::RetryPending, Trigger::Manual) => {
                debug!("수동 새로고침: 예약된 재시도 취소");
                self.retry_at = None;
            }
            (RefreshPhase::RetryPending, _) => {
                debug!("{trigger:?} 무시: 재시도 대기 중");
                return;
            }
            (RefreshPhase::Idle, Trigger::Retry) => return,
            (RefreshPhase::Idle, _) => {}
        }

        if trigger == Trigger::Manual {
            self.retry.reset();
        }

        if !self.online {
            self.suppress_offline(trigger);
            return;
        }

        self.start_cycle(trigger);
    }

    fn suppress_offline(&mut self, trigger: Trigger) {
        debug!("{trigger:?} 억제: 오프라인");
        self.retry_at = None;
        self.phase = RefreshPhase::Idle;
        let attempt = self.retry.attempt();
        self.publisher.update(|s| {
            s.loading = false;
            s.error = Some(CoreError::Offline.to_string());
            s.retry_attempt = attempt;
            s.is_online = false;
            s.phase = RefreshPhase::Idle;
        });
    }

    fn start_cycle(&mut self, trigger: Trigger) {
        debug!("새로고침 사이클 시작 ({trigger:?})");
        self.phase = RefreshPhase::Fetching;
        self.publisher.update(|s| {
            s.loading = true;
            s.error = None;
            s.phase = RefreshPhase::Fetching;
        });

        let engine = self.engine.clone();
        self.in_flight = Some(async move { engine.lock().await.run_cycle().await }.boxed());
    }

    fn finish_cycle(&mut self, result: Result<CycleOutcome, CoreError>) {
        self.in_flight = None;

        match result {
            Ok(outcome) => {
                if outcome.from_cache {
                    debug!("캐시된 스냅샷 발행");
                }
                self.retry.reset();
                self.phase = RefreshPhase::Idle;
                self.publisher.update(|s| {
                    s.snapshot = Some(outcome.snapshot);
                    s.loading = false;
                    s.error = None;
                    s.last_update = Some(Utc::now());
                    s.retry_attempt = 0;
                    s.phase = RefreshPhase::Idle;
                });
            }
            Err(e) => {
                let delay = if e.is_retryable() {
                    self.retry.record_failure()
                } else {
                    None
                };

                match delay {
                    Some(delay) => {
                        warn!(
                            "새로고침 실패 ({}회): {e} - {}ms 후 재시도",
                            self.retry.attempt(),
                            delay.as_millis()
                        );
                        self.retry_at = Some(Instant::now() + delay);
                        self.phase = RefreshPhase::RetryPending;
                    }
                    None => {
                        warn!("새로고침 실패 ({}회): {e} - 자동 재시도 없음", self.retry.attempt());
                        self.phase = RefreshPhase::Idle;
                    }
                }

                let attempt = self.retry.attempt();
                let phase = self.phase;
                self.publisher.update(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                    s.retry_attempt = attempt;
                    s.phase = phase;
                });
            }
        }
    }

    fn set_online(&mut self, online: bool) {
        let was_online = self.online;
        self.online = online;
        self.publisher.update(|s| s.is_online = online);

        if online && !was_online {
            info!("연결 복구 - 새로고침");
            self.trigger(Trigger::Reconnect);
        } else if !online && was_online {
            warn!("오프라인 전환 - 자동 새로고침 억제");
        }
    }
}

/// 진행 중인 사이클 완료 대기 (없으면 영원히 대기)
async fn await_cycle(in_flight: &mut Option<CycleFuture>) -> Result<CycleOutcome, CoreError> {
    match in_flight.as_mut() {
        Some(cycle) => cycle.await,
        None => std::future::pending().await,
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365)
}
