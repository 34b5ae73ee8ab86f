//! 인스턴스 도메인 모델.

use serde::{Deserialize, Serialize};

/// 인스턴스 도메인의 단일 인스턴스
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// 인스턴스 ID
    pub instance: u32,
    /// 인스턴스 이름 (예: "sda")
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<serde_json::Map<String, serde_json::Value>>,
}

/// `/pmapi[/{context}]/indom` 응답
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDomain {
    /// 인스턴스 도메인 ID (예: "60.1")
    #[serde(default)]
    pub indom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl InstanceDomain {
    /// 인스턴스 ID로 이름 조회
    pub fn name_of(&self, instance: u32) -> Option<&str> {
        self.instances
            .iter()
            .find(|i| i.instance == instance)
            .map(|i| i.name.as_str())
    }
}
