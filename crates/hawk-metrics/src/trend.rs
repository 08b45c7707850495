//! 이전 값 대비 추세 계산.

use hawk_core::models::metric::Trend;

/// 변화율 1% 미만은 보합
const STABLE_THRESHOLD_PERCENT: f64 = 1.0;

/// 추세와 변화율 텍스트
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChange {
    pub trend: Trend,
    /// 예: "+10.0%", "-3.2%", 이전 값이 0이면 "0%"
    pub change: String,
}

/// 현재 값을 이전 값과 비교
pub fn calculate_trend(current: f64, previous: f64) -> TrendChange {
    if previous == 0.0 || !previous.is_finite() {
        return TrendChange {
            trend: Trend::Stable,
            change: "0%".to_string(),
        };
    }

    let change = (current - previous) / previous * 100.0;
    let trend = if change.abs() < STABLE_THRESHOLD_PERCENT {
        Trend::Stable
    } else if change > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    };

    TrendChange {
        trend,
        change: format_change(change),
    }
}

fn format_change(change: f64) -> String {
    // -0.0 은 "+0.0%"로 표기
    let change = if change == 0.0 { 0.0 } else { change };
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{sign}{change:.1}%")
}
