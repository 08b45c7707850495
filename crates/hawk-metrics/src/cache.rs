//! 스냅샷 캐시.
//!
//! 마지막으로 계산한 스냅샷 하나만 보관한다. TTL 이내 조회는 같은 스냅샷을
//! 돌려주며 네트워크 조회를 건너뛰게 한다. tokio 시계를 사용하므로
//! 테스트에서 시간을 멈추고 앞당길 수 있다.

use hawk_core::models::metric::MetricSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// 기본 TTL (10초)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// 캐시 항목
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Arc<MetricSnapshot>,
    pub computed_at: Instant,
}

/// 단일 슬롯 TTL 캐시
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// TTL 이내면 스냅샷 반환
    pub fn get(&self) -> Option<Arc<MetricSnapshot>> {
        let entry = self.entry.as_ref()?;
        let age = entry.computed_at.elapsed();
        if age < self.ttl {
            debug!("스냅샷 캐시 적중 (경과 {}ms)", age.as_millis());
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    /// 스냅샷 저장 (기존 항목 교체)
    pub fn put(&mut self, snapshot: Arc<MetricSnapshot>) {
        self.entry = Some(CacheEntry {
            snapshot,
            computed_at: Instant::now(),
        });
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("스냅샷 캐시 무효화");
        }
    }

    /// 마지막 저장 이후 경과 시간
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|e| e.computed_at.elapsed())
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
