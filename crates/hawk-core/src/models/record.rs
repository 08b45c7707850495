//! 원시 텔레메트리 레코드 모델.
//!
//! `GET /api/data` 응답의 `list` 항목. SDK 버전과 수집 플러그인에 따라
//! 필드 구성이 달라지므로 모든 필드를 선택값으로 받는다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 레코드 카테고리 (`type` 필드)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordCategory {
    /// 사용자 행동 (페이지 로드, 라우트 변경, 클릭 등)
    Behavior,
    /// 성능 측정 (navigation/resource timing 등)
    Performance,
    /// 에러 이벤트
    Error,
    /// 그 외 모든 값
    #[default]
    #[serde(other)]
    Other,
}

impl RecordCategory {
    fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("behavior") => Self::Behavior,
            Some("performance") => Self::Performance,
            Some("error") => Self::Error,
            _ => Self::Other,
        }
    }
}

/// 서브타입: 문자열 태그 또는 중첩 `type`을 가진 구조체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubType {
    /// 행동 레코드의 문자열 태그 (예: "load", "route_change")
    Tag(String),
    /// 성능 레코드의 구조화된 서브타입
    Detail(SubTypeDetail),
    /// 해석할 수 없는 값 (숫자, 배열 등)
    Unknown(Value),
}

/// 성능 레코드의 구조화된 서브타입
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTypeDetail {
    /// 중첩 타입 (예: "navigation", "resource")
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    /// 측정 시각 (밀리초)
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timestamp: Option<f64>,
    /// 리소스 이름 또는 URL
    #[serde(default)]
    pub name: Option<Value>,
    /// 소요 시간 (밀리초)
    #[serde(default, deserialize_with = "lenient::millis")]
    pub duration: Option<f64>,
    /// 리소스 initiator (script, img 등)
    #[serde(default)]
    pub initiator_type: Option<Value>,
}

/// 서버에서 수신한 단일 텔레메트리 이벤트
///
/// 엔진이 읽는 필드만 타입을 해석하고, 형태가 어긋난 값은 비어 있는 것으로
/// 취급한다. 목록 하나의 이상한 레코드가 응답 전체를 실패시키지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// 레코드 카테고리
    #[serde(rename = "type", default, deserialize_with = "lenient::category")]
    pub category: RecordCategory,
    /// 서브타입
    #[serde(default)]
    pub sub_type: Option<SubType>,
    /// 이벤트 발생 시각 (밀리초, 숫자 또는 숫자 문자열)
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timestamp: Option<f64>,
    /// 서버 저장 ID
    #[serde(default)]
    pub id: Option<Value>,
    /// SDK가 발급한 이벤트 ID (숫자는 문자열로 변환)
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub event_id: Option<String>,
    /// 서버 수신 시각
    #[serde(default)]
    pub received_at: Option<Value>,
    /// 프로젝트 ID
    #[serde(default)]
    pub project_id: Option<Value>,
    /// 불투명 페이로드 (사용자/세션 식별자가 중첩될 수 있음)
    #[serde(default)]
    pub data: Option<Value>,
    /// 최상위 기본 정보 (일부 SDK 버전)
    #[serde(default)]
    pub base_info: Option<Value>,
}

/// 형태가 고정되지 않은 필드용 역직렬화 함수
mod lenient {
    use super::RecordCategory;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn category<'de, D>(deserializer: D) -> Result<RecordCategory, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(RecordCategory::from_value(&value))
    }

    pub(super) fn millis<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(opt_string(deserializer)?.unwrap_or_default())
    }
}

impl RawRecord {
    /// 문자열 서브타입 태그
    pub fn sub_type_tag(&self) -> Option<&str> {
        match &self.sub_type {
            Some(SubType::Tag(tag)) => Some(tag.as_str()),
            _ => None,
        }
    }

    /// 구조화된 서브타입의 중첩 `type`
    pub fn sub_type_kind(&self) -> Option<&str> {
        match &self.sub_type {
            Some(SubType::Detail(detail)) => Some(detail.kind.as_str()),
            _ => None,
        }
    }

    /// 유효한(0이 아닌) 이벤트 타임스탬프
    pub fn timestamp_ms(&self) -> Option<f64> {
        self.timestamp.filter(|ts| *ts != 0.0 && ts.is_finite())
    }
}
