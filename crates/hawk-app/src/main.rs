//! # hawk-app
//!
//! Hawk 대시보드 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 스케줄러/프로브/명령 루프 실행, 종료 처리.

mod commands;
mod console;
mod lifecycle;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use hawk_core::config::AppConfig;
use hawk_core::config_manager::ConfigManager;
use hawk_metrics::engine::{EngineSettings, MetricsEngine};
use hawk_metrics::publisher::SnapshotPublisher;
use hawk_metrics::scheduler::{RefreshScheduler, SchedulerConfig};
use hawk_network::connectivity::{ConnectivityManager, ReachabilityMonitor, TcpProbe};
use hawk_network::http_client::HttpTelemetrySource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::CommandContext;
use crate::console::ConsoleRenderer;
use crate::lifecycle::{ForegroundTracker, LifecycleManager};

/// Hawk 대시보드
///
/// 모니터링 서버에서 텔레메트리를 읽어 PV/UV/이벤트/에러율을 주기적으로 표시
#[derive(Parser, Debug)]
#[command(name = "hawk-dashboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 모니터링 서버 URL (기본: http://localhost:3001)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// 설정 파일 경로 (JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 자동 새로고침 주기 (밀리초)
    #[arg(long)]
    refresh_interval: Option<u64>,

    /// 강제 오프라인 상태로 시작
    #[arg(long, short = 'o')]
    offline: bool,

    /// 연결 프로브 비활성화
    #[arg(long)]
    no_probe: bool,

    /// 한 번만 계산해 스냅샷 JSON 출력 후 종료
    #[arg(long)]
    once: bool,
}

/// CLI 인자로 설정 덮어쓰기
fn apply_overrides(mut config: AppConfig, args: &Args) -> Result<AppConfig> {
    if let Some(server) = &args.server {
        config.source.base_url = server.clone();
    }
    if let Some(interval) = args.refresh_interval {
        config.refresh.interval_ms = interval;
    }
    if args.no_probe {
        config.connectivity.probe_enabled = false;
    }
    config
        .validate()
        .map_err(|e| anyhow!("설정 검증 실패: {e}"))?;
    Ok(config)
}

fn init_tracing(log_level: &str) {
    let log_filter = format!(
        "hawk_dashboard={0},hawk_core={0},hawk_network={0},hawk_metrics={0}",
        log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    // 설정 로드: --config 우선, 없으면 플랫폼 기본 경로에 파일이 있을 때만
    let config_path = args
        .config
        .clone()
        .or_else(|| ConfigManager::default_config_path().filter(|p| p.exists()));
    let config_manager =
        ConfigManager::load(config_path.as_deref()).map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    let config = apply_overrides(config_manager.get(), &args)?;

    info!("Hawk 대시보드 시작, 소스: {}", config.source.base_url);

    let source = Arc::new(
        HttpTelemetrySource::new(&config.source.base_url, config.request_timeout())
            .map_err(|e| anyhow!("텔레메트리 소스 생성 실패: {e}"))?,
    );
    let mut engine = MetricsEngine::new(source, EngineSettings::from_config(&config));

    if args.once {
        let outcome = engine
            .run_cycle()
            .await
            .map_err(|e| anyhow!("메트릭 계산 실패: {e}"))?;
        let json = serde_json::to_string_pretty(outcome.snapshot.as_ref())
            .context("스냅샷 직렬화 실패")?;
        println!("{json}");
        return Ok(());
    }

    let lifecycle = Arc::new(LifecycleManager::new());
    let connectivity = Arc::new(ConnectivityManager::new(
        config.connectivity.offline_threshold,
    ));
    if args.offline {
        connectivity.set_force_offline(true);
    }
    let foreground = Arc::new(ForegroundTracker::new());

    let publisher = SnapshotPublisher::new();
    let renderer = Arc::new(ConsoleRenderer::new(config.refresh.max_retries));
    let render_task = publisher.attach(renderer);

    let (scheduler, scheduler_handle) = RefreshScheduler::new(
        SchedulerConfig::from_config(&config),
        engine,
        publisher.clone(),
        connectivity.clone(),
        foreground.clone(),
    );
    let scheduler_task = tokio::spawn(scheduler.run(lifecycle.subscribe()));

    if config.connectivity.probe_enabled {
        match TcpProbe::for_base_url(&config.source.base_url, config.probe_timeout()) {
            Ok(probe) => {
                info!("연결 프로브 대상: {}", probe.target());
                let monitor = ReachabilityMonitor::new(
                    Arc::new(probe),
                    connectivity.clone(),
                    config.probe_interval(),
                );
                tokio::spawn(monitor.run(lifecycle.subscribe()));
            }
            Err(e) => warn!("연결 프로브 비활성화: {e}"),
        }
    }

    let command_ctx = CommandContext {
        scheduler: scheduler_handle,
        connectivity,
        foreground,
        publisher,
        config: config_manager,
        lifecycle: lifecycle.clone(),
    };
    tokio::spawn(commands::run_stdin(command_ctx, lifecycle.subscribe()));
    println!("{}", commands::HELP);

    lifecycle
        .wait_for_shutdown()
        .await
        .context("시그널 핸들러 등록 실패")?;

    if let Err(e) = scheduler_task.await {
        warn!("스케줄러 태스크 비정상 종료: {e}");
    }
    render_task.abort();

    info!("Hawk 대시보드 종료");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(extra: &[&str]) -> Args {
        let mut argv = vec!["hawk-dashboard"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_parse() {
        let args = parse_args(&[]);
        assert_eq!(args.log_level, "info");
        assert!(!args.once);
        assert!(args.server.is_none());
    }

    #[test]
    fn overrides_apply_to_config() {
        let args = parse_args(&[
            "--server",
            "http://monitor.local:9000",
            "--refresh-interval",
            "5000",
            "--no-probe",
        ]);
        let config = apply_overrides(AppConfig::default_config(), &args).unwrap();
        assert_eq!(config.source.base_url, "http://monitor.local:9000");
        assert_eq!(config.refresh.interval_ms, 5_000);
        assert!(!config.connectivity.probe_enabled);
    }

    #[test]
    fn invalid_override_rejected() {
        let args = parse_args(&["--refresh-interval", "0"]);
        assert!(apply_overrides(AppConfig::default_config(), &args).is_err());

        let args = parse_args(&["--server", "ftp://nope"]);
        assert!(apply_overrides(AppConfig::default_config(), &args).is_err());
    }
}
