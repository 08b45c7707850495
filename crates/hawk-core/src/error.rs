//! Hawk 핵심 에러 타입.
//!
//! 어댑터 crate와 메트릭 엔진은 모두 이 타입으로 실패를 보고한다.
//! 사이클 실패는 문자열로 변환되어 대시보드 상태에 노출된다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 데이터 소스 응답 실패 (2xx 외 상태 코드 또는 전송 실패)
    #[error("데이터 소스 응답 실패 ({}): {status_text}", status_label(.status))]
    SourceUnavailable {
        /// HTTP 상태 코드 (전송 실패 시 None)
        status: Option<u16>,
        /// 상태 텍스트 또는 전송 에러 설명
        status_text: String,
    },

    /// 요청 타임아웃
    #[error("요청 타임아웃: {timeout_ms}ms 초과")]
    Timeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 오프라인 상태라 새로고침이 억제됨
    #[error("네트워크 연결 불가: 오프라인 상태입니다")]
    Offline,

    /// 응답 본문 파싱 실패
    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 자동 재시도 대상인지 판별
    ///
    /// 오프라인은 백오프 대상이 아니라 별도 상태로 보고된다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::SourceUnavailable { .. }
                | CoreError::Timeout { .. }
                | CoreError::Parse(_)
                | CoreError::Serialization(_)
                | CoreError::Internal(_)
        )
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "transport".to_string(),
    }
}
