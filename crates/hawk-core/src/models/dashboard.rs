//! 대시보드 표시 상태.
//!
//! 메트릭 엔진이 발행하고 표시 레이어가 구독하는 관찰 가능한 상태.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::metric::MetricSnapshot;

/// 새로고침 스케줄러 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    RetryPending,
}

impl std::fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshPhase::Idle => write!(f, "Idle"),
            RefreshPhase::Fetching => write!(f, "Fetching"),
            RefreshPhase::RetryPending => write!(f, "RetryPending"),
        }
    }
}

/// 표시 레이어에 전달되는 현재 상태
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// 마지막으로 발행된 스냅샷
    pub snapshot: Option<Arc<MetricSnapshot>>,
    /// 사이클 진행 중 여부
    pub loading: bool,
    /// 현재 표시 중인 에러
    pub error: Option<String>,
    /// 마지막 성공 시각
    pub last_update: Option<DateTime<Utc>>,
    /// 현재 재시도 횟수
    pub retry_attempt: u32,
    /// 호스트 연결 상태
    pub is_online: bool,
    pub phase: RefreshPhase,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            snapshot: None,
            loading: false,
            error: None,
            last_update: None,
            retry_attempt: 0,
            is_online: true,
            phase: RefreshPhase::Idle,
        }
    }
}
