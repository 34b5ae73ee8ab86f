//! reqwest 기반 HTTP 전송.
//!
//! `HttpTransport` 포트 구현. 응답 본문을 JSON으로 디코딩하고, 비-2xx 응답은
//! 디코딩된 에러 본문과 함께 `TransportError`로 돌려준다.
//! `with_credentials` 요청만 쿠키 저장소를 읽고 쓴다.

use async_trait::async_trait;
use pmapi_core::error::TransportError;
use pmapi_core::ports::transport::{HttpMethod, HttpTransport, TransportRequest, TransportResponse};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// reqwest 전송 어댑터
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    cookies: Arc<Jar>,
}

impl ReqwestTransport {
    /// 요청 타임아웃을 지정해 생성
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::connection(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self::with_client(client))
    }

    /// 이미 구성된 reqwest 클라이언트로 생성
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            cookies: Arc::new(Jar::default()),
        }
    }

    fn build(&self, request: &TransportRequest, url: &Url) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url.clone());
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &request.basic_auth {
            builder = builder.basic_auth(&auth.username, auth.password.as_ref());
        }
        if request.with_credentials {
            if let Some(cookie) = self.cookies.cookies(url) {
                builder = builder.header(COOKIE, cookie);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        debug!("HTTP {:?} {}", request.method, request.url);

        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::connection(format!("잘못된 URL '{}': {e}", request.url)))?;

        let resp = self.build(&request, &url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::connection(format!("요청 타임아웃: {e}"))
            } else {
                TransportError::connection(format!("요청 실패: {e}"))
            }
        })?;

        if request.with_credentials {
            let mut set_cookies = resp.headers().get_all(SET_COOKIE).iter();
            self.cookies.set_cookies(&mut set_cookies, &url);
        }

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            TransportError::status(status.as_u16(), format!("응답 본문 읽기 실패: {e}"), None)
        })?;

        if !status.is_success() {
            let data = serde_json::from_str::<serde_json::Value>(&text).ok();
            warn!("pmproxy 에러 응답 ({status}): {text}");
            return Err(TransportError::status(
                status.as_u16(),
                status
                    .canonical_reason()
                    .unwrap_or("HTTP error")
                    .to_string(),
                data,
            ));
        }

        let data = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                TransportError::status(status.as_u16(), format!("JSON 파싱 실패: {e}"), None)
            })?
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            data,
        })
    }
}
