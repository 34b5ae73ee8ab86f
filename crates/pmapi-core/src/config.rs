//! 애플리케이션 설정 구조체.
//!
//! pmproxy 주소, 컨테이너, 요청 타임아웃, 기본 요청 옵션(헤더/인증)을 정의한다.
//! `ConfigManager`를 통해 JSON 파일과 환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::PmApiError;
use crate::models::request::{BasicAuth, DatasourceRequestOptions};

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// pmproxy 연결 설정
    #[serde(default)]
    pub pmproxy: PmproxyConfig,
    /// 기본 요청 옵션
    #[serde(default)]
    pub request: RequestConfig,
}

/// pmproxy 연결 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmproxyConfig {
    /// pmproxy 기본 URL
    #[serde(default = "default_url")]
    pub url: String,
    /// 컨텍스트를 바인딩할 컨테이너 이름
    #[serde(default)]
    pub container: Option<String>,
    /// 클라이언트측 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for PmproxyConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            container: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl PmproxyConfig {
    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 비어 있지 않은 컨테이너 이름
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// 모든 요청에 병합되는 기본 옵션
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    /// pmproxy 세션 쿠키 유지
    #[serde(default)]
    pub with_credentials: bool,
}

impl RequestConfig {
    /// 전송 레이어용 요청 옵션으로 변환
    pub fn to_request_options(&self) -> DatasourceRequestOptions {
        DatasourceRequestOptions {
            headers: self.headers.clone(),
            basic_auth: self.basic_auth.clone(),
            with_credentials: self.with_credentials,
        }
    }
}

fn default_url() -> String {
    "http://localhost:44322".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<(), PmApiError> {
        let parsed = url::Url::parse(&self.pmproxy.url)
            .map_err(|e| PmApiError::Config(format!("잘못된 pmproxy URL '{}': {e}", self.pmproxy.url)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PmApiError::Config(format!(
                "지원하지 않는 URL 스킴: {}",
                parsed.scheme()
            )));
        }

        if self.pmproxy.request_timeout_ms == 0 {
            return Err(PmApiError::Config(
                "request_timeout_ms는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(())
    }

    /// 끝 슬래시를 제거한 pmproxy URL
    pub fn base_url(&self) -> &str {
        self.pmproxy.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = AppConfig::default_config();
        assert_eq!(config.pmproxy.url, "http://localhost:44322");
        assert_eq!(config.pmproxy.request_timeout(), Duration::from_secs(30));
        assert!(config.pmproxy.container().is_none());
        assert!(config.request.headers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"pmproxy": {"container": "web"}}"#).unwrap();
        assert_eq!(config.pmproxy.url, "http://localhost:44322");
        assert_eq!(config.pmproxy.container(), Some("web"));
        assert_eq!(config.pmproxy.request_timeout_ms, 30_000);
    }

    #[test]
    fn blank_container_is_ignored() {
        let mut config = AppConfig::default_config();
        config.pmproxy.container = Some("  ".to_string());
        assert!(config.pmproxy.container().is_none());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AppConfig::default_config();
        config.pmproxy.url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.pmproxy.url = "ftp://metrics.example.com".to_string();
        assert!(config.validate().is_err());

        config.pmproxy.url = "https://metrics.example.com/".to_string();
        config.pmproxy.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.pmproxy.request_timeout_ms = 1_000;
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), "https://metrics.example.com");
    }

    #[test]
    fn request_options_conversion() {
        let mut config = AppConfig::default_config();
        config
            .request
            .headers
            .insert("X-Scope".to_string(), "ops".to_string());
        config.request.basic_auth = Some(BasicAuth {
            username: "pcp".to_string(),
            password: Some("pcp".to_string()),
        });
        assert!(!config.request.to_request_options().with_credentials);
        config.request.with_credentials = true;

        let options = config.request.to_request_options();
        assert_eq!(options.headers["X-Scope"], "ops");
        assert!(options.with_credentials);
        assert_eq!(options.basic_auth.unwrap().username, "pcp");
    }
}
