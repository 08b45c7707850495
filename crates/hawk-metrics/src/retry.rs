//! 재시도 상태.
//!
//! 실패할 때마다 시도 횟수를 올리고, 최대치 미만이면 `기본 지연 × 시도 횟수`
//! 뒤에 한 번 더 시도한다. 성공이나 수동 새로고침이 횟수를 초기화한다.

use hawk_core::config::AppConfig;
use std::time::Duration;
use tracing::debug;

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 자동 재시도를 멈추는 시도 횟수
    pub max_retries: u32,
    /// 기본 지연 (시도 횟수만큼 곱해짐)
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.refresh.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// 연속 실패 추적
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// 현재 시도 횟수 (0..=max)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 실패 기록: 재시도할 경우 대기 시간 반환
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.attempt = self
            .attempt
            .saturating_add(1)
            .min(self.policy.max_retries);

        if self.attempt < self.policy.max_retries {
            let delay = self.policy.base_delay.saturating_mul(self.attempt);
            debug!(
                "재시도 예약: {}/{} ({}ms 후)",
                self.attempt,
                self.policy.max_retries,
                delay.as_millis()
            );
            Some(delay)
        } else {
            debug!("재시도 한도 도달 ({})", self.attempt);
            None
        }
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// 자동 재시도 한도 소진 여부
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.policy.max_retries
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
