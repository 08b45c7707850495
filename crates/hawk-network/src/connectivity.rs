//! 연결 상태 관리.
//!
//! 소스 호스트 도달 가능성을 추적하고 온라인/오프라인 전환을 알린다.
//! 새로고침 스케줄러는 `ConnectivityObserver`로 이 상태를 구독한다.

use async_trait::async_trait;
use hawk_core::error::CoreError;
use hawk_core::ports::environment::ConnectivityObserver;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// 실패가 있었지만 아직 임계값 미만
    Degraded,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Degraded => write!(f, "Degraded"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// 연결 상태 관리자
///
/// 연속 실패가 임계값에 도달하면 오프라인, 성공 한 번이면 온라인으로 전환.
/// 전환 시에만 구독자에게 알린다.
pub struct ConnectivityManager {
    /// 마지막으로 관측된 도달 가능 여부
    reachable: AtomicBool,
    /// 마지막 성공 시각 (Unix 밀리초, 0 = 없음)
    last_success_ms: AtomicU64,
    /// 연속 실패 횟수
    failure_count: AtomicU64,
    /// 오프라인 전환 임계값 (연속 실패 횟수)
    offline_threshold: u64,
    /// 강제 오프라인 모드
    force_offline: AtomicBool,
    /// 유효 온라인 상태 브로드캐스트
    online_tx: watch::Sender<bool>,
}

impl ConnectivityManager {
    /// 새 연결 관리자 생성 (초기 상태 온라인)
    pub fn new(offline_threshold: u64) -> Self {
        let (online_tx, _) = watch::channel(true);
        Self {
            reachable: AtomicBool::new(true),
            last_success_ms: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            offline_threshold: offline_threshold.max(1),
            force_offline: AtomicBool::new(false),
            online_tx,
        }
    }

    /// 유효 온라인 상태를 다시 계산해 변경 시에만 알림
    fn publish(&self) {
        let online = self.is_online();
        let changed = self.online_tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        if changed {
            if online {
                info!("소스 연결 복구됨 - 온라인");
            } else {
                warn!("소스 연결 끊김 - 오프라인");
            }
        }
    }

    /// 강제 오프라인 모드 설정
    ///
    /// 해제하면 도달 가능 상태로 간주하고 즉시 온라인을 알린다.
    pub fn set_force_offline(&self, force: bool) {
        self.force_offline.store(force, Ordering::Relaxed);
        if force {
            info!("강제 오프라인 모드 활성화");
        } else {
            self.reachable.store(true, Ordering::Relaxed);
            self.failure_count.store(0, Ordering::Relaxed);
            info!("강제 오프라인 모드 해제");
        }
        self.publish();
    }

    /// 강제 오프라인 모드 여부
    pub fn is_force_offline(&self) -> bool {
        self.force_offline.load(Ordering::Relaxed)
    }

    /// 외부 신호로 온라인/오프라인 직접 설정 (임계값 무시)
    pub fn set_online(&self, online: bool) {
        self.reachable.store(online, Ordering::Relaxed);
        if online {
            self.failure_count.store(0, Ordering::Relaxed);
        }
        self.publish();
    }

    /// 현재 유효 온라인 상태
    pub fn is_online(&self) -> bool {
        !self.is_force_offline() && self.reachable.load(Ordering::Relaxed)
    }

    /// 현재 연결 상태
    pub fn status(&self) -> ConnectionStatus {
        if !self.is_online() {
            ConnectionStatus::Disconnected
        } else if self.failure_count() > 0 {
            ConnectionStatus::Degraded
        } else {
            ConnectionStatus::Connected
        }
    }

    /// 연결 성공 기록: 실패 카운터 리셋, 필요 시 온라인 전환
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        self.reachable.store(true, Ordering::Relaxed);
        self.last_success_ms.store(unix_millis(), Ordering::Relaxed);
        self.publish();
    }

    /// 연결 실패 기록: 임계값 도달 시 오프라인 전환
    pub fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("연결 실패 기록 (연속 {}회)", count);

        if count >= self.offline_threshold {
            self.reachable.store(false, Ordering::Relaxed);
            self.publish();
        }
    }

    /// 연속 실패 횟수
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// 마지막 성공 이후 경과 시간 (성공 기록이 없으면 None)
    pub fn time_since_last_success(&self) -> Option<Duration> {
        match self.last_success_ms.load(Ordering::Relaxed) {
            0 => None,
            last => Some(Duration::from_millis(unix_millis().saturating_sub(last))),
        }
    }

    /// 연결 상태 통계
    pub fn stats(&self) -> ConnectivityStats {
        ConnectivityStats {
            is_online: self.is_online(),
            status: self.status(),
            failure_count: self.failure_count(),
            time_since_last_success: self.time_since_last_success(),
            force_offline: self.is_force_offline(),
        }
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ConnectivityObserver for ConnectivityManager {
    fn is_online(&self) -> bool {
        ConnectivityManager::is_online(self)
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// 연결 상태 통계
#[derive(Debug, Clone)]
pub struct ConnectivityStats {
    pub is_online: bool,
    pub status: ConnectionStatus,
    pub failure_count: u64,
    pub time_since_last_success: Option<Duration>,
    pub force_offline: bool,
}

/// 도달 가능성 검사 방법
#[async_trait]
pub trait Probe: Send + Sync {
    /// 한 번 검사: 도달 가능하면 true
    async fn check(&self) -> bool;
}

/// TCP 연결 프로브: 소스 호스트:포트에 연결 시도
pub struct TcpProbe {
    target: String,
    timeout: Duration,
}

impl TcpProbe {
    /// 소스 기본 URL에서 호스트/포트 추출
    pub fn for_base_url(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let url = Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 소스 URL '{base_url}': {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| CoreError::Config(format!("소스 URL에 호스트가 없습니다: {base_url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| CoreError::Config(format!("소스 URL 포트를 알 수 없습니다: {base_url}")))?;

        Ok(Self {
            target: format!("{host}:{port}"),
            timeout,
        })
    }

    /// 연결 대상 (host:port)
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("프로브 연결 실패 ({}): {e}", self.target);
                false
            }
            Err(_) => {
                debug!("프로브 타임아웃 ({})", self.target);
                false
            }
        }
    }
}

/// 주기적 도달 가능성 검사 루프
pub struct ReachabilityMonitor {
    probe: Arc<dyn Probe>,
    manager: Arc<ConnectivityManager>,
    interval: Duration,
}

impl ReachabilityMonitor {
    pub fn new(probe: Arc<dyn Probe>, manager: Arc<ConnectivityManager>, interval: Duration) -> Self {
        Self {
            probe,
            manager,
            interval,
        }
    }

    /// 한 번 검사 후 결과 기록
    pub async fn probe_once(&self) -> bool {
        let reachable = self.probe.check().await;
        if reachable {
            self.manager.record_success();
        } else {
            self.manager.record_failure();
        }
        reachable
    }

    /// 종료 신호까지 주기적으로 검사
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("연결 프로브 시작: 주기 {:?}", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("연결 프로브 종료");
    }
}
