//! 사용자 식별자 조회.
//!
//! SDK 버전마다 사용자 정보가 놓이는 위치와 키 이름이 달라서
//! 선언된 후보 목록을 순서대로 확인한다. 값의 참/거짓 판정은 JSON 기준
//! (null, false, 0, "" 는 거짓).

use hawk_core::models::record::RawRecord;
use serde_json::Value;

/// `data` 내부의 사용자 정보 컨테이너 후보 키 (우선순위 순)
pub const CONTAINER_KEYS: [&str; 2] = ["baseInfo", "userInfo"];

/// 사용자 식별자 후보 키 (우선순위 순)
pub const USER_ID_KEYS: [&str; 4] = ["userUuid", "sdkUserUuid", "userId", "sessionId"];

/// 컨테이너 탐색 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerScope {
    /// `data.baseInfo` → `data.userInfo` → `data`
    Payload,
    /// `data.baseInfo` → `data.userInfo` → `data` → 레코드 최상위 `baseInfo`
    PayloadAndBaseInfo,
}

/// JSON 값의 참/거짓 판정
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 후보 중 처음으로 참인 값
pub fn first_truthy<'a, I>(candidates: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates.into_iter().flatten().find(|v| is_truthy(v))
}

/// 레코드의 사용자 정보 컨테이너
pub fn user_info_container(record: &RawRecord, scope: ContainerScope) -> Option<&Value> {
    let data = record.data.as_ref();
    let nested = CONTAINER_KEYS
        .iter()
        .map(move |key| data.and_then(|d| d.get(*key)));
    let base_info = match scope {
        ContainerScope::Payload => None,
        ContainerScope::PayloadAndBaseInfo => record.base_info.as_ref(),
    };

    first_truthy(nested.chain([data, base_info]))
}

/// 컨테이너에서 사용자 식별자 추출
pub fn user_id(container: &Value) -> Option<String> {
    first_truthy(USER_ID_KEYS.iter().map(|key| container.get(*key))).map(id_to_string)
}

/// 레코드에서 바로 사용자 식별자 추출
pub fn record_user_id(record: &RawRecord, scope: ContainerScope) -> Option<String> {
    user_info_container(record, scope).and_then(user_id)
}

fn id_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
