//! 콘솔 렌더러: 대시보드 상태를 터미널에 출력.

use chrono::Local;
use hawk_core::models::dashboard::DashboardState;
use hawk_core::models::metric::{MetricCard, Trend};
use hawk_core::ports::consumer::MetricsConsumer;
use std::fmt::Write;

/// 표준 출력 렌더러
///
/// 로딩 시작은 한 줄만 출력하고, 사이클이 끝나면 카드 전체를 다시 그린다.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    max_retries: u32,
}

impl ConsoleRenderer {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// 상태를 출력 문자열로 변환
    pub fn format_state(&self, state: &DashboardState) -> String {
        let mut out = String::new();

        if state.loading {
            let _ = writeln!(out, "⏳ 새로고침 중...");
            return out;
        }

        let updated = state
            .last_update
            .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let network = if state.is_online {
            "🟢 온라인"
        } else {
            "🔴 오프라인"
        };
        let _ = writeln!(
            out,
            "── Hawk 대시보드 ── 마지막 업데이트 {updated} | {network} | {}",
            state.phase
        );

        match &state.snapshot {
            Some(snapshot) => {
                for card in &snapshot.cards {
                    let _ = writeln!(out, "{}", format_card(card));
                }
            }
            None => {
                let _ = writeln!(out, "  (데이터 없음)");
            }
        }

        if let Some(error) = &state.error {
            if state.retry_attempt > 0 {
                let _ = writeln!(
                    out,
                    "⚠️  {error} (재시도 {}/{})",
                    state.retry_attempt, self.max_retries
                );
            } else {
                let _ = writeln!(out, "⚠️  {error}");
            }
        }

        out
    }
}

impl MetricsConsumer for ConsoleRenderer {
    fn render(&self, state: &DashboardState) {
        print!("{}", self.format_state(state));
    }
}

fn format_card(card: &MetricCard) -> String {
    let arrow = match card.trend {
        Some(Trend::Up) => "▲",
        Some(Trend::Down) => "▼",
        Some(Trend::Stable) | None => "─",
    };
    format!(
        "  [{}] {:<12} {:>10} {:<3} {} {}",
        card.badge,
        card.title,
        card.value,
        card.unit,
        arrow,
        card.change.as_deref().unwrap_or("")
    )
}
