//! 텔레메트리 소스 HTTP 클라이언트.
//!
//! `TelemetrySource` 포트 구현. 요청별 타임아웃 + 상태 코드 에러 매핑.
//! 재시도는 하지 않는다 (새로고침 스케줄러가 사이클 단위로 재시도).

use async_trait::async_trait;
use hawk_core::error::CoreError;
use hawk_core::models::counters::AggregateCounters;
use hawk_core::models::record::RawRecord;
use hawk_core::ports::telemetry_source::TelemetrySource;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 집계 카운터 경로
const STATS_PATH: &str = "/api/stats";

/// 레코드 목록 경로
const DATA_PATH: &str = "/api/data";

/// `{ "data": T }` 응답 래퍼
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// `{ "list": [...] }` 레코드 목록
#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    list: Option<Vec<RawRecord>>,
}

/// 레코드 조회 카테고리 (`type` 쿼리 파라미터)
#[derive(Debug, Clone, Copy)]
enum RecordKind {
    Behaviors,
    Performance,
}

impl RecordKind {
    fn as_query(&self) -> &'static str {
        match self {
            RecordKind::Behaviors => "behaviors",
            RecordKind::Performance => "performance",
        }
    }
}

/// REST 텔레메트리 소스: `TelemetrySource` 포트 구현
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTelemetrySource {
    /// 새 HTTP 소스 클라이언트 생성
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| CoreError::Config(format!("잘못된 소스 URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// 서버 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, CoreError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| CoreError::Internal(format!("URL 구성 실패: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// 전송 에러 매핑 (타임아웃 분리)
    fn map_transport_error(&self, error: reqwest::Error) -> CoreError {
        if error.is_timeout() {
            CoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            CoreError::SourceUnavailable {
                status: error.status().map(|s| s.as_u16()),
                status_text: error.to_string(),
            }
        }
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            tracing::warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });
        debug!("소스 에러 응답 ({status}): {text}");

        Err(CoreError::SourceUnavailable {
            status: Some(status.as_u16()),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }

    /// GET 요청 후 JSON 본문 파싱
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CoreError> {
        debug!("소스 조회: {url}");

        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let resp = self.check_response(resp).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        serde_json::from_str(&body)
            .map_err(|e| CoreError::Parse(format!("{} 응답 파싱 실패: {e}", url.path())))
    }

    async fn fetch_records(
        &self,
        kind: RecordKind,
        limit: usize,
    ) -> Result<Vec<RawRecord>, CoreError> {
        let url = self.endpoint(
            DATA_PATH,
            &[("type", kind.as_query().to_string()), ("limit", limit.to_string())],
        )?;
        let envelope: DataEnvelope<RecordList> = self.get_json(url).await?;
        let records = envelope.data.list.unwrap_or_default();
        debug!("{} 레코드 {}개 수신", kind.as_query(), records.len());
        Ok(records)
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_counters(&self) -> Result<AggregateCounters, CoreError> {
        let url = self.endpoint(STATS_PATH, &[])?;
        let envelope: DataEnvelope<AggregateCounters> = self.get_json(url).await?;
        debug!("집계 카운터 수신: total={}", envelope.data.total);
        Ok(envelope.data)
    }

    async fn fetch_behaviors(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError> {
        self.fetch_records(RecordKind::Behaviors, limit).await
    }

    async fn fetch_performance(&self, limit: usize) -> Result<Vec<RawRecord>, CoreError> {
        self.fetch_records(RecordKind::Performance, limit).await
    }
}
