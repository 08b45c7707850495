//! # hawk-metrics
//!
//! 원시 텔레메트리 레코드를 대시보드 헤드라인 메트릭으로 변환하고
//! 주기적 새로고침/재시도를 관리한다.
//!
//! ## 구조
//!
//! - [`identity`]: 사용자 식별자 순차 조회
//! - [`extractor`]: 단계별(tier) PV/UV 추출, 에러율 계산
//! - [`trend`]: 이전 값 대비 추세
//! - [`cache`]: TTL 단일 슬롯 스냅샷 캐시
//! - [`retry`]: 재시도 횟수/백오프 계산
//! - [`engine`]: 한 사이클 조합 (캐시 → 조회 → 추출 → 추세 → 캐시 저장)
//! - [`publisher`]: `watch` 기반 대시보드 상태 발행
//! - [`scheduler`]: 트리거/재시도 상태 머신

pub mod cache;
pub mod engine;
pub mod extractor;
pub mod identity;
pub mod publisher;
pub mod retry;
pub mod scheduler;
pub mod trend;

#[cfg(test)]
pub(crate) mod test_support;
