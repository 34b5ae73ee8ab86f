//! HTTP 전송 포트.
//!
//! 실제 네트워크 호출을 수행하는 메커니즘. 구현: `pmapi-network` crate (reqwest).
//! 이 포트는 상태가 없으며 호출 간 공유 자원을 두지 않는다.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::TransportError;
use crate::models::request::{BasicAuth, DatasourceRequestOptions};

/// HTTP 메서드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// 전송 요청 기술자
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// 쿼리 문자열을 제외한 전체 URL
    pub url: String,
    /// 쿼리 파라미터 (순서 유지)
    pub params: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub basic_auth: Option<BasicAuth>,
    /// 쿠키 자격증명 포함 여부
    pub with_credentials: bool,
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// GET 요청 생성
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// JSON 본문을 가진 POST 요청 생성
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body),
            ..Self::default()
        }
    }

    /// 쿼리 파라미터 추가 (builder)
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// 쿼리 파라미터 값 조회
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// 데이터소스 기본 옵션 병합.
    ///
    /// 요청에 이미 있는 값이 우선한다. 헤더는 이름 단위(대소문자 무시)로 병합.
    /// 쿠키 자격증명은 어느 한쪽이라도 켜져 있으면 포함한다.
    pub fn with_defaults(mut self, defaults: &DatasourceRequestOptions) -> Self {
        for (name, value) in &defaults.headers {
            let present = self
                .headers
                .keys()
                .any(|existing| existing.eq_ignore_ascii_case(name));
            if !present {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        if self.basic_auth.is_none() {
            self.basic_auth = defaults.basic_auth.clone();
        }
        self.with_credentials |= defaults.with_credentials;
        self
    }
}

/// 전송 응답 (디코딩된 JSON 본문)
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: serde_json::Value,
}

/// HTTP 전송 메커니즘
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 요청 실행. 2xx가 아니거나 연결에 실패하면 `TransportError`.
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_values_win_over_defaults() {
        let defaults = DatasourceRequestOptions::new()
            .with_header("Authorization", "Basic ZGVmYXVsdA==")
            .with_header("X-Grafana-Org-Id", "1")
            .with_basic_auth("admin", Some("secret".to_string()));

        let mut request = TransportRequest::get("http://localhost:44322/pmapi/context");
        request
            .headers
            .insert("authorization".to_string(), "Bearer token".to_string());

        let merged = request.with_defaults(&defaults);
        assert_eq!(merged.headers.len(), 2);
        assert_eq!(merged.headers["authorization"], "Bearer token");
        assert!(!merged.headers.contains_key("Authorization"));
        assert_eq!(merged.headers["X-Grafana-Org-Id"], "1");
        assert_eq!(merged.basic_auth.unwrap().username, "admin");
    }

    #[test]
    fn request_basic_auth_is_kept() {
        let defaults = DatasourceRequestOptions::new().with_basic_auth("admin", None);
        let mut request = TransportRequest::get("http://localhost/pmapi/context");
        request.basic_auth = Some(BasicAuth {
            username: "pcp".to_string(),
            password: None,
        });

        let merged = request.with_defaults(&defaults);
        assert_eq!(merged.basic_auth.unwrap().username, "pcp");
    }

    #[test]
    fn credentials_flag_comes_from_defaults() {
        let request = TransportRequest::get("http://localhost/pmapi/context");
        assert!(!request.clone().with_defaults(&DatasourceRequestOptions::new()).with_credentials);

        let merged = request.with_defaults(&DatasourceRequestOptions::new().with_credentials());
        assert!(merged.with_credentials);
    }

    #[test]
    fn post_carries_json_body() {
        let request = TransportRequest::post(
            "http://localhost/pmapi/5/store",
            serde_json::json!({"name": "pmcd.client.container", "value": "web"}),
        );
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.unwrap()["value"], "web");
    }

    #[test]
    fn params_keep_insertion_order() {
        let request = TransportRequest::get("http://localhost/pmapi/5/store")
            .param("name", "pmcd.client.container")
            .param("value", "web");

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.params[0].0, "name");
        assert_eq!(request.param_value("value"), Some("web"));
        assert_eq!(request.param_value("missing"), None);
    }
}
