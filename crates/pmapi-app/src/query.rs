//! 메트릭 질의 흐름.
//!
//! 컨텍스트 생성 → 메타데이터 조회 → 누락 메트릭 검사 → 값 조회.
//! 클라이언트가 조용히 빠뜨린 이름을 여기서 `MissingMetrics` 에러로 바꾼다.

use futures::future::try_join_all;
use pmapi_core::error::PmApiError;
use pmapi_core::models::context::Context;
use pmapi_core::models::fetch::FetchResponse;
use pmapi_core::models::instance::InstanceDomain;
use pmapi_core::models::metric::{MetricMetadata, MetricsResponse};
use pmapi_core::ports::pmapi::{PmApi, CONTAINER_BIND_METRIC};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// 질의 결과
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub context: Context,
    pub metadata: Vec<MetricMetadata>,
    /// 인스턴스 도메인이 있는 메트릭의 인스턴스 목록
    pub instances: Vec<InstanceDomain>,
    /// counter 시맨틱 메트릭 (값이 누적치이므로 rate 변환 필요)
    pub counters: Vec<String>,
    /// 샘플 시각 (Unix epoch 밀리초)
    pub timestamp_ms: i64,
    pub values: FetchResponse,
}

/// 요청 이름 중 응답에 없는 것이 있으면 `MissingMetrics` 에러
pub fn ensure_all_found(requested: &[String], response: &MetricsResponse) -> Result<(), PmApiError> {
    let missing = response.missing_names(requested);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PmApiError::missing_metrics(missing, None))
    }
}

/// 저장 요청의 인증/권한 실패를 `Permission` 에러로 변환
fn store_permission_error(err: PmApiError) -> PmApiError {
    let forbidden = matches!(
        &err,
        PmApiError::Network { cause: Some(cause), .. } if matches!(cause.status, Some(401 | 403))
    );
    if forbidden {
        PmApiError::permission(vec![CONTAINER_BIND_METRIC.to_string()], None)
    } else {
        err
    }
}

/// PMAPI 질의 실행기
pub struct QueryRunner {
    api: Arc<dyn PmApi>,
    url: String,
    container: Option<String>,
}

impl QueryRunner {
    pub fn new(api: Arc<dyn PmApi>, url: impl Into<String>, container: Option<String>) -> Self {
        Self {
            api,
            url: url.into(),
            container,
        }
    }

    /// 컨텍스트 생성 후 컨테이너 바인딩
    ///
    /// 바인딩은 `pmcd.client.container` 메트릭 저장이므로 401/403 응답은
    /// `Permission` 에러로 바꾼다.
    pub async fn open_context(&self) -> Result<Context, PmApiError> {
        let context = self.api.create_context(&self.url, None).await?;

        if let Some(container) = self.container.as_deref().filter(|c| !c.is_empty()) {
            self.api
                .bind_container(&self.url, context.context, container)
                .await
                .map_err(store_permission_error)?;
        }
        Ok(context)
    }

    /// 전체 질의 흐름 실행
    ///
    /// 어느 단계든 실패하면 재시도 없이 에러를 돌려준다. 호출자는 컨텍스트 생성부터
    /// 다시 시작해야 한다.
    pub async fn run(&self, names: &[String]) -> Result<QueryResult, PmApiError> {
        let context = self.open_context().await?;
        info!("컨텍스트 {} 에서 {}개 메트릭 질의", context.context, names.len());

        let metadata = self
            .api
            .get_metric_metadata(&self.url, context.context, names)
            .await?;
        ensure_all_found(names, &metadata)?;

        // 인스턴스 도메인 조회는 서로 독립적이므로 동시에 보낸다
        let instances = try_join_all(
            metadata
                .metrics
                .iter()
                .filter(|m| m.indom.is_some())
                .map(|m| {
                    self.api
                        .get_metric_instances(&self.url, Some(context.context), &m.name)
                }),
        )
        .await?;

        let values = self
            .api
            .get_metric_values(&self.url, Some(context.context), names)
            .await?;
        debug!("값 수신: {}개 메트릭", values.values.len());

        let counters = metadata
            .metrics
            .iter()
            .filter(|m| m.is_counter())
            .map(|m| m.name.clone())
            .collect();

        Ok(QueryResult {
            context,
            metadata: metadata.metrics,
            instances,
            counters,
            timestamp_ms: values.timestamp.as_millis(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;
    use pmapi_core::models::request::DatasourceRequestOptions;
    use pmapi_network::{PmApiClient, ReqwestTransport};
    use std::time::Duration;

    fn runner(url: &str, container: Option<&str>) -> QueryRunner {
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(5)).unwrap());
        let api = Arc::new(PmApiClient::new(transport, DatasourceRequestOptions::default()));
        QueryRunner::new(api, url, container.map(str::to_string))
    }

    #[test]
    fn ensure_all_found_reports_missing() {
        let response: MetricsResponse =
            serde_json::from_value(serde_json::json!({"metrics": [{"name": "a.b"}]})).unwrap();

        assert!(ensure_all_found(&["a.b".to_string()], &response).is_ok());

        let err = ensure_all_found(&["a.b".to_string(), "c.d".to_string()], &response).unwrap_err();
        assert_matches!(err, PmApiError::MissingMetrics { ref metrics, .. } if metrics == &["c.d".to_string()]);
        assert_eq!(
            err.to_string(),
            "Cannot find metric c.d. Please check if the PMDA is enabled."
        );
    }

    #[tokio::test]
    async fn run_full_query() {
        let mut server = mockito::Server::new_async().await;
        let ctx = server
            .mock("GET", "/pmapi/context")
            .match_query(Matcher::UrlEncoded("polltimeout".into(), "30".into()))
            .with_status(200)
            .with_body(r#"{"context": 11}"#)
            .expect(1)
            .create_async()
            .await;
        let store = server
            .mock("GET", "/pmapi/11/store")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "pmcd.client.container".into()),
                Matcher::UrlEncoded("value".into(), "web".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .expect(1)
            .create_async()
            .await;
        let _metric = server
            .mock("GET", "/pmapi/11/metric")
            .match_query(Matcher::UrlEncoded("names".into(), "disk.dev.read,hinv.ncpu".into()))
            .with_status(200)
            .with_body(
                r#"{"metrics": [
                    {"name": "disk.dev.read", "pmid": "60.0.4", "indom": "60.1", "type": "u32", "sem": "counter", "units": "count"},
                    {"name": "hinv.ncpu", "pmid": "60.0.32", "type": "u32", "sem": "discrete", "units": "none"}
                ]}"#,
            )
            .create_async()
            .await;
        let indom = server
            .mock("GET", "/pmapi/11/indom")
            .match_query(Matcher::UrlEncoded("name".into(), "disk.dev.read".into()))
            .with_status(200)
            .with_body(r#"{"indom": "60.1", "instances": [{"instance": 0, "name": "sda"}]}"#)
            .expect(1)
            .create_async()
            .await;
        let _fetch = server
            .mock("GET", "/pmapi/11/fetch")
            .match_query(Matcher::UrlEncoded("names".into(), "disk.dev.read,hinv.ncpu".into()))
            .with_status(200)
            .with_body(
                r#"{"timestamp": 1547483646.5, "values": [
                    {"pmid": "60.0.4", "name": "disk.dev.read", "instances": [{"instance": 0, "value": 1234}]},
                    {"pmid": "60.0.32", "name": "hinv.ncpu", "instances": [{"instance": null, "value": 8}]}
                ]}"#,
            )
            .create_async()
            .await;

        let names = vec!["disk.dev.read".to_string(), "hinv.ncpu".to_string()];
        let result = runner(&server.url(), Some("web")).run(&names).await.unwrap();

        assert_eq!(result.context.context.0, 11);
        assert_eq!(result.metadata.len(), 2);
        assert_eq!(result.instances.len(), 1);
        assert_eq!(result.instances[0].name_of(0), Some("sda"));
        assert_eq!(result.counters, vec!["disk.dev.read".to_string()]);
        assert_eq!(result.timestamp_ms, 1_547_483_646_500);
        assert_eq!(
            result.values.metric("hinv.ncpu").unwrap().instances[0].value.as_f64(),
            Some(8.0)
        );
        ctx.assert_async().await;
        store.assert_async().await;
        indom.assert_async().await;
    }

    #[tokio::test]
    async fn forbidden_container_bind_is_permission_error() {
        let mut server = mockito::Server::new_async().await;
        let _ctx = server
            .mock("GET", "/pmapi/context")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"context": 4}"#)
            .create_async()
            .await;
        let _store = server
            .mock("GET", "/pmapi/4/store")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message": "No permission to perform requested operation"}"#)
            .create_async()
            .await;

        let err = runner(&server.url(), Some("web"))
            .open_context()
            .await
            .unwrap_err();

        assert_matches!(err, PmApiError::Permission { .. });
        assert_eq!(
            err.to_string(),
            "Insufficient permissions to store metric pmcd.client.container."
        );
    }

    #[tokio::test]
    async fn failed_container_bind_keeps_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _ctx = server
            .mock("GET", "/pmapi/context")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"context": 4}"#)
            .create_async()
            .await;
        let _store = server
            .mock("GET", "/pmapi/4/store")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = runner(&server.url(), Some("web"))
            .open_context()
            .await
            .unwrap_err();
        assert_matches!(err, PmApiError::Network { .. });
    }

    #[tokio::test]
    async fn run_reports_missing_metric() {
        let mut server = mockito::Server::new_async().await;
        let _ctx = server
            .mock("GET", "/pmapi/context")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"context": 3}"#)
            .create_async()
            .await;
        let _metric = server
            .mock("GET", "/pmapi/3/metric")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"message": "Unknown metric name bogus.metric", "success": false}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/pmapi/3/fetch")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = runner(&server.url(), None)
            .run(&["bogus.metric".to_string()])
            .await
            .unwrap_err();

        assert_matches!(err, PmApiError::MissingMetrics { .. });
        assert_eq!(err.metrics(), ["bogus.metric".to_string()]);
        fetch.assert_async().await;
    }
}
