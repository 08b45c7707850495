//! 메트릭 소비자 포트.
//!
//! 스냅샷과 로딩/에러 상태를 렌더링하는 모든 표시 레이어.

use crate::models::dashboard::DashboardState;

/// 대시보드 상태 렌더러
pub trait MetricsConsumer: Send + Sync {
    /// 상태 변경 시마다 호출
    fn render(&self, state: &DashboardState);
}
