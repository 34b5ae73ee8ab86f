//! 데이터소스 요청 옵션.
//!
//! 호출자가 소유하는 기본 헤더/자격증명. 모든 전송 요청에 병합되며
//! 이 레이어에서는 읽기 전용이다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP Basic 인증 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// 호출자 기본 요청 옵션
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRequestOptions {
    /// 모든 요청에 붙는 헤더
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Basic 인증
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
    /// 서버가 내려준 쿠키를 보관하고 이후 요청에 함께 보낼지 여부
    #[serde(default)]
    pub with_credentials: bool,
}

impl DatasourceRequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 헤더 추가 (builder)
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Basic 인증 설정 (builder)
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password,
        });
        self
    }

    /// 쿠키 자격증명 전송 (builder)
    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }
}
