//! pmproxy PMAPI REST 클라이언트.
//!
//! `PmApi` 포트 구현. 모든 요청은 [`PmApiClient::datasource_request`]를 거쳐
//! 기본 요청 옵션이 병합되고, 전송 실패는 `PmApiError::Network`로 래핑된다.

use async_trait::async_trait;
use pmapi_core::error::PmApiError;
use pmapi_core::models::context::{Context, ContextId, StoreResponse};
use pmapi_core::models::fetch::FetchResponse;
use pmapi_core::models::instance::InstanceDomain;
use pmapi_core::models::metric::MetricsResponse;
use pmapi_core::models::request::DatasourceRequestOptions;
use pmapi_core::ports::pmapi::{PmApi, CONTAINER_BIND_METRIC};
use pmapi_core::ports::transport::{HttpTransport, TransportRequest, TransportResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// 컨텍스트 생성 시 서버에 전달하는 keep-alive 힌트 (초)
const POLL_TIMEOUT_SECS: u32 = 30;

/// PMAPI REST 클라이언트 — `PmApi` 포트 구현
///
/// 상태가 없으므로 `Arc`로 공유해 동시에 호출해도 된다.
#[derive(Clone)]
pub struct PmApiClient {
    transport: Arc<dyn HttpTransport>,
    request_options: DatasourceRequestOptions,
}

impl PmApiClient {
    /// 전송 메커니즘과 호출자 기본 옵션으로 생성
    pub fn new(transport: Arc<dyn HttpTransport>, request_options: DatasourceRequestOptions) -> Self {
        Self {
            transport,
            request_options,
        }
    }

    /// 기본 옵션 병합 후 요청 실행
    ///
    /// 어떤 전송 실패든 원본을 보존한 `PmApiError::Network`로 바뀐다.
    pub async fn datasource_request(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, PmApiError> {
        let request = request.with_defaults(&self.request_options);
        self.transport
            .request(request)
            .await
            .map_err(PmApiError::network)
    }

    /// 필수 필드 존재 여부 확인
    fn require_field(data: &serde_json::Value, field: &str) -> Result<(), PmApiError> {
        if data.get(field).is_none() {
            warn!("pmproxy 응답에 '{field}' 필드 없음");
            return Err(PmApiError::malformed_response());
        }
        Ok(())
    }

    /// 서버 응답을 타입으로 디코딩. 형식이 맞지 않으면 응답 형식 위반
    fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, PmApiError> {
        serde_json::from_value(data).map_err(|e| {
            warn!("pmproxy 응답 디코딩 실패: {e}");
            PmApiError::malformed_response()
        })
    }
}

/// 컨텍스트 경로 조각. 익명 조회면 빈 문자열
fn context_path(context: Option<ContextId>) -> String {
    context.map(|id| format!("/{id}")).unwrap_or_default()
}

fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

#[async_trait]
impl PmApi for PmApiClient {
    async fn create_context(
        &self,
        url: &str,
        container: Option<&str>,
    ) -> Result<Context, PmApiError> {
        debug!("컨텍스트 생성 요청: {url}");

        let request = TransportRequest::get(format!("{}/pmapi/context", base(url)))
            .param("polltimeout", POLL_TIMEOUT_SECS);
        let response = self.datasource_request(request).await?;

        Self::require_field(&response.data, "context")?;
        let context: Context = Self::decode(response.data)?;
        debug!("컨텍스트 생성 성공: context={}", context.context);

        if let Some(container) = container.filter(|c| !c.is_empty()) {
            self.bind_container(url, context.context, container).await?;
        }

        Ok(context)
    }

    async fn bind_container(
        &self,
        url: &str,
        context: ContextId,
        container: &str,
    ) -> Result<StoreResponse, PmApiError> {
        debug!("컨테이너 바인딩: context={context}, container={container}");

        let request = TransportRequest::get(format!("{}/pmapi/{context}/store", base(url)))
            .param("name", CONTAINER_BIND_METRIC)
            .param("value", container);
        let response = self.datasource_request(request).await?;

        if response.data.is_null() {
            return Ok(StoreResponse { success: true });
        }
        Self::decode(response.data)
    }

    async fn get_metric_metadata(
        &self,
        url: &str,
        context: ContextId,
        names: &[String],
    ) -> Result<MetricsResponse, PmApiError> {
        // 여러 메트릭 요청 중 일부가 없으면 pmproxy는 유효한 메트릭만 반환하고,
        // 없는 메트릭 하나만 요청하면 400을 반환한다.
        let request = TransportRequest::get(format!("{}/pmapi/{context}/metric", base(url)))
            .param("names", names.join(","));

        match self.datasource_request(request).await {
            Ok(response) => {
                let metrics: MetricsResponse = Self::decode(response.data)?;
                debug!(
                    "메타데이터 조회: 요청 {}개, 수신 {}개",
                    names.len(),
                    metrics.metrics.len()
                );
                Ok(metrics)
            }
            Err(e) if e.is_unknown_metric() => {
                debug!("알 수 없는 메트릭, 빈 결과 반환: {e}");
                Ok(MetricsResponse::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn get_metric_instances(
        &self,
        url: &str,
        context: Option<ContextId>,
        name: &str,
    ) -> Result<InstanceDomain, PmApiError> {
        let request = TransportRequest::get(format!(
            "{}/pmapi{}/indom",
            base(url),
            context_path(context)
        ))
        .param("name", name);
        let response = self.datasource_request(request).await?;

        Self::decode(response.data)
    }

    async fn get_metric_values(
        &self,
        url: &str,
        context: Option<ContextId>,
        names: &[String],
    ) -> Result<FetchResponse, PmApiError> {
        let request = TransportRequest::get(format!(
            "{}/pmapi{}/fetch",
            base(url),
            context_path(context)
        ))
        .param("names", names.join(","));
        let response = self.datasource_request(request).await?;

        Self::require_field(&response.data, "timestamp")?;
        Self::decode(response.data)
    }
}
