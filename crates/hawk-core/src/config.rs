//! 애플리케이션 설정 구조체.
//!
//! 데이터 소스 URL, 새로고침 주기, 캐시 TTL, 재시도 정책, 연결 프로브 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::ports::telemetry_source::DEFAULT_FETCH_LIMIT;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 텔레메트리 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 새로고침/캐시/재시도 설정
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// 연결 상태 프로브 설정
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

// ============================================================
// 소스 설정
// ============================================================

/// 텔레메트리 소스 설정: 모니터링 서버 조회
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 서버 기본 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 요청별 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 행동/성능 레코드 조회 한도
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

// ============================================================
// 새로고침 설정
// ============================================================

/// 새로고침 설정: 주기, 스냅샷 캐시, 재시도 백오프
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// 자동 새로고침 주기 (밀리초)
    #[serde(default = "default_refresh_interval_ms")]
    pub interval_ms: u64,
    /// 스냅샷 캐시 TTL (밀리초)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// 자동 재시도 최대 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 재시도 기본 지연 (밀리초, 시도 횟수만큼 곱해짐)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_refresh_interval_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

// ============================================================
// 연결 프로브 설정
// ============================================================

/// 연결 상태 프로브 설정: 소스 호스트 도달 가능성 확인
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// 프로브 활성화 여부
    #[serde(default = "default_true")]
    pub probe_enabled: bool,
    /// 프로브 주기 (밀리초)
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// 프로브 연결 타임아웃 (밀리초)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// 오프라인 전환 임계값 (연속 실패 횟수)
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            offline_threshold: default_offline_threshold(),
        }
    }
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.source.request_timeout_ms)
    }

    /// 자동 새로고침 주기를 Duration으로 반환
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.interval_ms)
    }

    /// 스냅샷 캐시 TTL을 Duration으로 반환
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.refresh.cache_ttl_ms)
    }

    /// 재시도 기본 지연을 Duration으로 반환
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.refresh.retry_base_delay_ms)
    }

    /// 프로브 주기를 Duration으로 반환
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_interval_ms)
    }

    /// 프로브 타임아웃을 Duration으로 반환
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_timeout_ms)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source.base_url.trim().is_empty() {
            return Err(validation("source.base_url", "비어 있을 수 없습니다"));
        }
        if !self.source.base_url.starts_with("http://")
            && !self.source.base_url.starts_with("https://")
        {
            return Err(validation(
                "source.base_url",
                "http:// 또는 https:// 로 시작해야 합니다",
            ));
        }
        let positive = [
            ("source.request_timeout_ms", self.source.request_timeout_ms),
            ("source.fetch_limit", self.source.fetch_limit as u64),
            ("refresh.interval_ms", self.refresh.interval_ms),
            ("connectivity.probe_interval_ms", self.connectivity.probe_interval_ms),
            ("connectivity.probe_timeout_ms", self.connectivity.probe_timeout_ms),
            ("connectivity.offline_threshold", self.connectivity.offline_threshold),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(validation(field, "0보다 커야 합니다"));
            }
        }
        Ok(())
    }
}

fn validation(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

fn default_refresh_interval_ms() -> u64 {
    30_000
}

fn default_cache_ttl_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    2_000
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_offline_threshold() -> u64 {
    3
}
