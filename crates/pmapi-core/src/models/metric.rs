//! 메트릭 메타데이터 모델.

use serde::{Deserialize, Serialize};

/// 단일 메트릭의 메타데이터 (서버 스냅샷)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricMetadata {
    /// 메트릭 이름 (예: "disk.dev.read")
    pub name: String,
    /// PMID (예: "60.0.4")
    #[serde(default)]
    pub pmid: String,
    /// 인스턴스 도메인 참조. 단일값 메트릭이면 없음
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indom: Option<String>,
    /// 값 타입 ("u32", "u64", "double", "string" 등)
    #[serde(rename = "type", default)]
    pub metric_type: String,
    /// 시맨틱 ("counter", "instant", "discrete")
    #[serde(default)]
    pub sem: String,
    /// 단위 (예: "count", "Kbyte / sec")
    #[serde(default)]
    pub units: String,
    /// 시계열 식별자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<serde_json::Map<String, serde_json::Value>>,
    /// 한 줄 도움말
    #[serde(rename = "text-oneline", default, skip_serializing_if = "Option::is_none")]
    pub text_oneline: Option<String>,
    /// 상세 도움말
    #[serde(rename = "text-help", default, skip_serializing_if = "Option::is_none")]
    pub text_help: Option<String>,
}

impl MetricMetadata {
    /// counter 시맨틱 여부 (rate 변환 대상)
    pub fn is_counter(&self) -> bool {
        self.sem == "counter"
    }
}

/// `/pmapi/{context}/metric` 응답
///
/// 여러 이름을 요청하면 서버가 모르는 이름은 조용히 빠진다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub metrics: Vec<MetricMetadata>,
}

impl MetricsResponse {
    /// 응답에 없는 요청 이름 (요청 순서 유지)
    pub fn missing_names(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|name| !self.metrics.iter().any(|m| &m.name == *name))
            .cloned()
            .collect()
    }
}
