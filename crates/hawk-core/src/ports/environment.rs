//! 실행 환경 관찰자 포트.
//!
//! 연결 상태와 포그라운드 상태를 스케줄러에 주입한다.
//! 구현: `hawk-network::connectivity` (연결), `hawk-app::lifecycle` (포그라운드)

use tokio::sync::watch;

/// 호스트 온라인/오프라인 상태 관찰자
pub trait ConnectivityObserver: Send + Sync {
    /// 현재 온라인 여부
    fn is_online(&self) -> bool;

    /// 상태 변경 수신기 (true = 온라인)
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// 포그라운드/백그라운드 상태 관찰자
pub trait ForegroundObserver: Send + Sync {
    /// 현재 포그라운드 여부
    fn is_foreground(&self) -> bool;

    /// 상태 변경 수신기 (true = 포그라운드)
    fn subscribe(&self) -> watch::Receiver<bool>;
}
