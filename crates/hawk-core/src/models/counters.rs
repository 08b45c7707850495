//! 서버 집계 카운터 모델.

use serde::{Deserialize, Serialize};

/// 현재 윈도우의 서버 집계 합계 (`GET /api/stats`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounters {
    /// 일반 이벤트 수
    #[serde(default)]
    pub events: u64,
    /// 에러 이벤트 수
    #[serde(default)]
    pub errors: u64,
    /// 성능 이벤트 수
    #[serde(default)]
    pub performance: u64,
    /// 행동 이벤트 수
    #[serde(default)]
    pub behaviors: u64,
    /// 전체 이벤트 수
    #[serde(default)]
    pub total: u64,
}
