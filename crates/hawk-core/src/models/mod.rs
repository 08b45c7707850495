//! Hawk 도메인 모델.
//!
//! 모니터링 서버 응답과 대시보드 표시용 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod counters;
pub mod dashboard;
pub mod metric;
pub mod record;
