//! 메트릭 카드 / 스냅샷 모델.
//!
//! 한 번의 새로고침 사이클이 생성하는 4장 카드 결과.
//! 스냅샷은 생성 후 변경되지 않으며 다음 사이클 결과로 교체된다.

use serde::{Deserialize, Serialize};

/// 카드 식별자: 이전 값 조회 시 조인 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricId {
    /// 독립 방문자 수 (UV)
    ActiveUsers,
    /// 페이지 조회수 (PV)
    PageViews,
    /// 전체 이벤트 수
    TotalEvents,
    /// 에러율
    ErrorRate,
}

impl MetricId {
    /// 스냅샷 카드 순서
    pub const ALL: [MetricId; 4] = [
        MetricId::ActiveUsers,
        MetricId::PageViews,
        MetricId::TotalEvents,
        MetricId::ErrorRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::ActiveUsers => "active-users",
            MetricId::PageViews => "page-views",
            MetricId::TotalEvents => "total-events",
            MetricId::ErrorRate => "error-rate",
        }
    }
}

impl std::fmt::Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이전 값 대비 추세
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// 대시보드 카드 한 장
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    pub id: MetricId,
    pub title: String,
    pub description: String,
    /// 표시용 값 (예: "1,234", "33.3%")
    pub value: String,
    /// 단위 레이블
    pub unit: String,
    pub badge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    /// 변화율 텍스트 (예: "+10.0%")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

impl MetricCard {
    /// 표시용 값을 숫자로 환산
    ///
    /// 천 단위 구분자와 `%` 접미사를 제거한다. 파싱 불가 시 0.
    pub fn numeric_value(&self) -> f64 {
        parse_display_number(&self.value)
    }
}

/// 표시용 숫자 문자열 파싱 ("1,234" → 1234, "33.3%" → 33.3)
pub fn parse_display_number(value: &str) -> f64 {
    let cleaned: String = value
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// 한 사이클의 4장 카드 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub cards: Vec<MetricCard>,
}

impl MetricSnapshot {
    pub fn new(cards: Vec<MetricCard>) -> Self {
        Self { cards }
    }

    /// 카드 ID로 조회
    pub fn card(&self, id: MetricId) -> Option<&MetricCard> {
        self.cards.iter().find(|card| card.id == id)
    }
}
