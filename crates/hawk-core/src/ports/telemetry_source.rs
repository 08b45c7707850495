//! 텔레메트리 소스 포트.
//!
//! 구현: `hawk-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::counters::AggregateCounters;
use crate::models::record::RawRecord;

/// 레코드 조회 기본 한도
pub const DEFAULT_FETCH_LIMIT: usize = 5_000;

/// 모니터링 서버 읽기 전용 조회 인터페이스
///
/// 세 조회는 서로 독립적이며 각자 타임아웃을 가진다.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// 현재 윈도우의 집계 카운터 조회
    async fn fetch_counters(&self) -> Result<AggregateCounters, CoreError>;

    /// 최근 행동 레코드 조회 (최대 `limit`개)
    async fn fetch_behaviors(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError>;

    /// 최근 성능 레코드 조회 (최대 `limit`개)
    async fn fetch_performance(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError>;
}
