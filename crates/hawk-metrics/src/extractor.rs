//! PV/UV 추출 및 에러율 계산.
//!
//! 행동 레코드를 우선 사용하고, 비어 있으면 성능 레코드로 단계적으로
//! 내려간다. 결과는 근사값이며 어느 단계가 값을 만들었는지 함께 보고한다.

use hawk_core::models::counters::AggregateCounters;
use hawk_core::models::record::{RawRecord, SubType};
use std::collections::HashSet;
use tracing::debug;

use crate::identity::{record_user_id, user_id, user_info_container, ContainerScope};

/// PV로 인정하는 행동 서브타입
pub const PV_BEHAVIOR_TAGS: [&str; 3] = ["load", "route_change", "pageView"];

/// PV로 인정하는 성능 서브타입 (구조화)
pub const PV_PERFORMANCE_KINDS: [&str; 4] = ["navigation", "load", "pageView", "resource"];

/// PV로 인정하는 성능 서브타입 (문자열 태그)
pub const PV_PERFORMANCE_TAGS: [&str; 3] = ["navigation", "load", "pageView"];

/// UV로 인정하는 행동 서브타입
pub const UV_BEHAVIOR_TAGS: [&str; 2] = ["load", "pageView"];

/// UV로 인정하는 성능 서브타입
pub const UV_PERFORMANCE_KINDS: [&str; 3] = ["navigation", "load", "resource"];

/// 방문 중복 제거 윈도우 (1분)
pub const VISIT_WINDOW_MS: f64 = 60_000.0;

/// 최후 단계 추정 윈도우 (5분)
pub const ESTIMATE_WINDOW_MS: f64 = 300_000.0;

/// 값을 만든 추출 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    /// 행동 레코드
    Behavior,
    /// 성능 레코드
    Performance,
    /// 성능 레코드 타임스탬프의 5분 윈도우 수
    TimeWindow,
}

/// 추출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCount {
    pub count: usize,
    pub tier: ExtractionTier,
}

impl TierCount {
    fn new(count: usize, tier: ExtractionTier) -> Self {
        Self { count, tier }
    }
}

/// 페이지 조회수 (PV)
///
/// 행동 레코드에 PV 이벤트가 하나도 없고 성능 레코드가 있을 때만 성능 단계로 내려간다.
pub fn page_views(behaviors: &[RawRecord], performance: &[RawRecord]) -> TierCount {
    let behavior_pv = behaviors
        .iter()
        .filter(|r| matches!(r.sub_type_tag(), Some(tag) if PV_BEHAVIOR_TAGS.contains(&tag)))
        .count();

    if behavior_pv > 0 || performance.is_empty() {
        debug!("PV 행동 단계: {behavior_pv}");
        return TierCount::new(behavior_pv, ExtractionTier::Behavior);
    }

    let performance_pv = performance
        .iter()
        .filter(|r| match &r.sub_type {
            Some(SubType::Detail(detail)) => PV_PERFORMANCE_KINDS.contains(&detail.kind.as_str()),
            Some(SubType::Tag(tag)) => PV_PERFORMANCE_TAGS.contains(&tag.as_str()),
            _ => false,
        })
        .count();

    debug!("PV 성능 단계: {performance_pv}");
    TierCount::new(performance_pv, ExtractionTier::Performance)
}

/// 독립 방문자 수 (UV)
///
/// `now_ms`는 행동 단계의 분 단위 버킷에 쓰이는 현재 벽시계 시각.
/// 성능 단계는 이벤트 자체의 타임스탬프로 버킷을 나눈다.
pub fn unique_visitors(
    behaviors: &[RawRecord],
    performance: &[RawRecord],
    now_ms: i64,
) -> TierCount {
    let mut visits = behavior_visit_keys(behaviors, now_ms);

    if !visits.is_empty() || performance.is_empty() {
        debug!("UV 행동 단계: {}", visits.len());
        return TierCount::new(visits.len(), ExtractionTier::Behavior);
    }

    for record in performance {
        let Some(kind) = record.sub_type_kind() else {
            continue;
        };
        if !UV_PERFORMANCE_KINDS.contains(&kind) {
            continue;
        }
        let Some(ts) = record.timestamp_ms() else {
            continue;
        };
        let window = window_of(ts, VISIT_WINDOW_MS);

        // 컨테이너가 있는데 식별자가 없으면 방문으로 치지 않는다
        let key = match user_info_container(record, ContainerScope::PayloadAndBaseInfo) {
            Some(container) => match user_id(container) {
                Some(id) => format!("{id}-{window}"),
                None => continue,
            },
            None => match record.event_id.as_deref().filter(|id| !id.is_empty()) {
                Some(event_id) => {
                    let prefix: String = event_id.chars().take(8).collect();
                    format!("{prefix}-{window}")
                }
                None => format!("visit-{window}"),
            },
        };
        visits.insert(key);
    }

    if !visits.is_empty() {
        debug!("UV 성능 단계: {}", visits.len());
        return TierCount::new(visits.len(), ExtractionTier::Performance);
    }

    let windows: HashSet<i64> = performance
        .iter()
        .filter_map(RawRecord::timestamp_ms)
        .map(|ts| window_of(ts, ESTIMATE_WINDOW_MS))
        .collect();

    debug!("UV 시간 윈도우 단계: {}", windows.len());
    TierCount::new(windows.len(), ExtractionTier::TimeWindow)
}

/// 행동 단계의 방문 키 (`<userId>-<현재 분>`)
pub fn behavior_visit_keys(behaviors: &[RawRecord], now_ms: i64) -> HashSet<String> {
    let now_window = now_ms.div_euclid(VISIT_WINDOW_MS as i64);
    behaviors
        .iter()
        .filter(|r| matches!(r.sub_type_tag(), Some(tag) if UV_BEHAVIOR_TAGS.contains(&tag)))
        .filter_map(|r| record_user_id(r, ContainerScope::Payload))
        .map(|id| format!("{id}-{now_window}"))
        .collect()
}

fn window_of(ts: f64, window_ms: f64) -> i64 {
    (ts / window_ms).floor() as i64
}

/// 에러율 (소수점 한 자리 문자열, `%` 없음)
pub fn error_rate(counters: &AggregateCounters) -> String {
    if counters.total == 0 {
        return "0.0".to_string();
    }
    let rate = counters.errors as f64 / counters.total as f64 * 100.0;
    format!("{rate:.1}")
}

/// 천 단위 구분자 포함 정수 표기 ("1,234")
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
