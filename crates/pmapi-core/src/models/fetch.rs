//! 메트릭 값 조회 모델.

use serde::{Deserialize, Serialize};

/// 샘플 시각.
///
/// pmproxy 버전에 따라 소수 초 또는 `{s, us}` 객체로 온다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(f64),
    Split { s: i64, us: i64 },
}

impl Timestamp {
    /// Unix epoch 기준 초
    pub fn as_secs_f64(&self) -> f64 {
        match *self {
            Timestamp::Seconds(secs) => secs,
            Timestamp::Split { s, us } => s as f64 + us as f64 / 1_000_000.0,
        }
    }

    /// Unix epoch 기준 밀리초
    pub fn as_millis(&self) -> i64 {
        (self.as_secs_f64() * 1000.0).round() as i64
    }
}

/// 인스턴스 값 (숫자 또는 문자열)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            MetricValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// fetch 결과의 단일 인스턴스 값
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceValue {
    /// 인스턴스 ID. 단일값 메트릭이면 `null`
    #[serde(default)]
    pub instance: Option<u32>,
    pub value: MetricValue,
}

/// 메트릭별 인스턴스 값 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInstanceValues {
    #[serde(default)]
    pub pmid: String,
    pub name: String,
    #[serde(default)]
    pub instances: Vec<InstanceValue>,
}

/// `/pmapi[/{context}]/fetch` 응답.
///
/// `values`는 서버가 해석할 수 있었던 이름만 담으며 순서는 서버가 정한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub values: Vec<MetricInstanceValues>,
}

impl FetchResponse {
    /// 이름으로 메트릭 값 조회
    pub fn metric(&self, name: &str) -> Option<&MetricInstanceValues> {
        self.values.iter().find(|v| v.name == name)
    }
}
