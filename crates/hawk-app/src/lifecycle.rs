//! 라이프사이클 관리.
//!
//! 종료 신호(SIGINT/SIGTERM, `quit` 명령)와 포그라운드 상태.

use hawk_core::ports::environment::ForegroundObserver;
use tokio::sync::watch;
use tracing::info;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// OS 시그널 또는 내부 종료 요청까지 대기
    pub async fn wait_for_shutdown(&self) -> std::io::Result<()> {
        let mut rx = self.subscribe();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => info!("SIGINT 수신"),
                _ = sigterm.recv() => info!("SIGTERM 수신"),
                _ = rx.wait_for(|stop| *stop) => return Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Ctrl+C 수신");
                }
                _ = rx.wait_for(|stop| *stop) => return Ok(()),
            }
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 포그라운드 추적기: `pause`/`resume` 명령으로 전환
pub struct ForegroundTracker {
    tx: watch::Sender<bool>,
}

impl ForegroundTracker {
    /// 포그라운드 상태로 시작
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx }
    }

    /// 상태 변경 (변경된 경우에만 알림)
    pub fn set_foreground(&self, foreground: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current != foreground {
                *current = foreground;
                true
            } else {
                false
            }
        });
        if changed {
            info!(
                "{}",
                if foreground {
                    "포그라운드 복귀"
                } else {
                    "백그라운드 전환"
                }
            );
        }
        changed
    }
}

impl Default for ForegroundTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundObserver for ForegroundTracker {
    fn is_foreground(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
