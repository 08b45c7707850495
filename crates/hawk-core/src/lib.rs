//! # hawk-core
//!
//! Hawk 대시보드 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 원시 레코드, 집계 카운터, 메트릭 카드/스냅샷, 대시보드 상태
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 로드 (기본값 → 파일 → 환경변수)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
