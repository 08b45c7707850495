//! 대화형 stdin 명령.
//!
//! `r`, `interval <ms>`, `pause`, `resume`, `offline`, `online`, `status`, `help`, `q`

use hawk_core::config_manager::ConfigManager;
use hawk_metrics::publisher::SnapshotPublisher;
use hawk_metrics::scheduler::SchedulerHandle;
use hawk_network::connectivity::ConnectivityManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::lifecycle::{ForegroundTracker, LifecycleManager};

/// 콘솔 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Interval(Duration),
    Pause,
    Resume,
    Offline,
    Online,
    Status,
    Help,
    Quit,
}

/// 한 줄 파싱 (빈 줄은 None)
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "r" | "refresh" => Command::Refresh,
        "interval" => {
            let ms = parts
                .next()
                .ok_or_else(|| "사용법: interval <밀리초>".to_string())?
                .parse::<u64>()
                .map_err(|e| format!("잘못된 주기: {e}"))?;
            if ms == 0 {
                return Err("주기는 0보다 커야 합니다".to_string());
            }
            Command::Interval(Duration::from_millis(ms))
        }
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "offline" => Command::Offline,
        "online" => Command::Online,
        "s" | "status" => Command::Status,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("알 수 없는 명령: {other} (help 참고)")),
    };

    if parts.next().is_some() {
        return Err(format!("인자가 너무 많습니다: {line}"));
    }
    Ok(Some(command))
}

pub const HELP: &str = "\
명령:
  r, refresh         지금 새로고침
  interval <ms>      자동 새로고침 주기 변경
  pause / resume     백그라운드 전환 / 포그라운드 복귀
  offline / online   강제 오프라인 설정 / 해제
  status             연결 상태와 재시도 횟수
  q, quit            종료";

/// 명령 실행에 필요한 컴포넌트
pub struct CommandContext {
    pub scheduler: SchedulerHandle,
    pub connectivity: Arc<ConnectivityManager>,
    pub foreground: Arc<ForegroundTracker>,
    pub publisher: SnapshotPublisher,
    pub config: ConfigManager,
    pub lifecycle: Arc<LifecycleManager>,
}

impl CommandContext {
    /// 명령 실행: 출력할 메시지 반환
    pub fn execute(&self, command: Command) -> Option<String> {
        match command {
            Command::Refresh => match self.scheduler.refresh() {
                Ok(()) => None,
                Err(e) => Some(format!("새로고침 요청 실패: {e}")),
            },
            Command::Interval(interval) => {
                if let Err(e) = self.scheduler.set_refresh_interval(interval) {
                    return Some(format!("주기 변경 실패: {e}"));
                }
                let ms = interval.as_millis() as u64;
                if let Err(e) = self.config.update_with(|c| c.refresh.interval_ms = ms) {
                    warn!("새로고침 주기 저장 실패: {e}");
                }
                Some(format!("자동 새로고침 주기: {ms}ms"))
            }
            Command::Pause => {
                self.foreground.set_foreground(false);
                Some("백그라운드 전환".to_string())
            }
            Command::Resume => {
                self.foreground.set_foreground(true);
                None
            }
            Command::Offline => {
                self.connectivity.set_force_offline(true);
                Some("강제 오프라인".to_string())
            }
            Command::Online => {
                self.connectivity.set_force_offline(false);
                None
            }
            Command::Status => {
                let stats = self.connectivity.stats();
                let state = self.publisher.current();
                Some(format!(
                    "연결: {} (연속 실패 {}회, 강제 오프라인 {}) | 단계: {} | 재시도: {}",
                    stats.status,
                    stats.failure_count,
                    stats.force_offline,
                    state.phase,
                    state.retry_attempt
                ))
            }
            Command::Help => Some(HELP.to_string()),
            Command::Quit => {
                self.lifecycle.shutdown();
                None
            }
        }
    }
}

/// stdin 명령 루프 (종료 신호 또는 EOF까지)
pub async fn run_stdin(ctx: CommandContext, mut shutdown_rx: watch::Receiver<bool>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            debug!("명령 수신: {command:?}");
                            if let Some(message) = ctx.execute(command) {
                                println!("{message}");
                            }
                        }
                        Ok(None) => {}
                        Err(message) => println!("{message}"),
                    },
                    Ok(None) => {
                        debug!("stdin 종료 - 명령 입력 비활성화");
                        break;
                    }
                    Err(e) => {
                        warn!("stdin 읽기 실패: {e}");
                        break;
                    }
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
