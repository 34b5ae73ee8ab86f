//! PMAPI 프로토콜 포트.
//!
//! 구현: `pmapi-network` crate (`PmApiClient`)

use async_trait::async_trait;

use crate::error::PmApiError;
use crate::models::context::{Context, ContextId, StoreResponse};
use crate::models::fetch::FetchResponse;
use crate::models::instance::InstanceDomain;
use crate::models::metric::MetricsResponse;

/// 컨테이너 이름을 인스턴스 값으로 제공하는 메트릭
pub const CONTAINERS_METRIC: &str = "containers.name";

/// 컨텍스트를 컨테이너에 바인딩할 때 값을 저장하는 pmcd 메트릭
pub const CONTAINER_BIND_METRIC: &str = "pmcd.client.container";

/// pmproxy REST 클라이언트
///
/// 모든 메서드는 상태가 없어 동시에 호출해도 된다. 컨텍스트 ID는 호출자가
/// 보관하고 전달한다.
#[async_trait]
pub trait PmApi: Send + Sync {
    /// 컨텍스트 생성. `container`가 주어지면 생성 직후 컨테이너에 바인딩한다.
    ///
    /// 바인딩이 실패하면 전체가 실패하며, 호출자는 처음부터 다시 시도해야 한다.
    async fn create_context(&self, url: &str, container: Option<&str>)
        -> Result<Context, PmApiError>;

    /// 기존 컨텍스트를 컨테이너에 바인딩
    async fn bind_container(
        &self,
        url: &str,
        context: ContextId,
        container: &str,
    ) -> Result<StoreResponse, PmApiError>;

    /// 메트릭 메타데이터 조회. 서버가 모르는 이름은 결과에서 빠진다.
    async fn get_metric_metadata(
        &self,
        url: &str,
        context: ContextId,
        names: &[String],
    ) -> Result<MetricsResponse, PmApiError>;

    /// 메트릭의 인스턴스 도메인 조회. `context`가 없으면 익명 조회.
    async fn get_metric_instances(
        &self,
        url: &str,
        context: Option<ContextId>,
        name: &str,
    ) -> Result<InstanceDomain, PmApiError>;

    /// 메트릭 현재값 조회. `context`가 없으면 익명 조회.
    async fn get_metric_values(
        &self,
        url: &str,
        context: Option<ContextId>,
        names: &[String],
    ) -> Result<FetchResponse, PmApiError>;

    /// 호스트에서 사용 가능한 컨테이너 이름 목록
    async fn list_containers(&self, url: &str) -> Result<Vec<String>, PmApiError> {
        let names = vec![CONTAINERS_METRIC.to_string()];
        let response = self.get_metric_values(url, None, &names).await?;

        Ok(response
            .metric(CONTAINERS_METRIC)
            .map(|metric| {
                metric
                    .instances
                    .iter()
                    .map(|instance| instance.value.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }
}
