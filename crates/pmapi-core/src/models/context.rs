//! PMAPI 컨텍스트 모델.
//!
//! pmproxy가 발급하는 서버측 세션 식별자. 이 레이어는 컨텍스트를 캐시하거나
//! 종료하지 않으며, 호출자가 수명을 관리한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 서버가 할당한 컨텍스트 ID (불투명 값, URL 경로에 그대로 사용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContextId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// `/pmapi/context` 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// 컨텍스트 ID
    pub context: ContextId,
    /// 메트릭 소스 식별자 (SHA1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 대상 호스트 지정자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostspec: Option<String>,
    /// 컨텍스트 레이블
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<serde_json::Map<String, serde_json::Value>>,
}

/// `/pmapi/{context}/store` 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    #[serde(default)]
    pub success: bool,
}
