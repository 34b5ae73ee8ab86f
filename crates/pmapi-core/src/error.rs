//! PMAPI 핵심 에러 타입.
//!
//! 클라이언트 메서드는 전송 실패와 응답 형식 위반을 모두 [`PmApiError::Network`]로
//! 올린다. [`PmApiError::MissingMetrics`]와 [`PmApiError::Permission`]은
//! 호출자(UI/CLI) 레벨에서 결과를 검사한 뒤 구성한다.

use thiserror::Error;

/// 형식이 잘못된 서버 응답 메시지
pub const MALFORMED_RESPONSE: &str = "Received malformed response";

/// pmproxy가 존재하지 않는 단일 메트릭 요청 시 돌려주는 메시지 조각
pub const UNKNOWN_METRIC_NAME: &str = "Unknown metric name";

/// 전송 계층 실패.
///
/// 주입된 HTTP 메커니즘이 돌려준 원본 실패. 상태 코드를 받은 경우 디코딩된
/// 에러 본문(`data`)을 함께 보관한다.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("HTTP 요청 실패{}: {message}", status_suffix(.status))]
pub struct TransportError {
    /// HTTP 상태 코드 (연결 실패/타임아웃이면 `None`)
    pub status: Option<u16>,
    /// 실패 설명
    pub message: String,
    /// 디코딩된 에러 응답 본문
    pub data: Option<serde_json::Value>,
}

impl TransportError {
    /// 상태 코드 없는 연결 수준 실패
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            data: None,
        }
    }

    /// 비-2xx 응답 실패
    pub fn status(status: u16, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            data,
        }
    }

    /// 에러 본문의 `message` 필드
    pub fn server_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("message"))
            .and_then(|message| message.as_str())
    }
}

/// PMAPI 에러.
#[derive(Debug, Error)]
pub enum PmApiError {
    /// 전송 실패 또는 신뢰할 수 없는 응답 형식
    #[error("{message}")]
    Network {
        /// 사용자 표시용 메시지
        message: String,
        /// 래핑된 원본 전송 실패
        #[source]
        cause: Option<TransportError>,
    },

    /// 요청한 메트릭 중 일부를 찾을 수 없음
    #[error("{message}")]
    MissingMetrics {
        /// 찾지 못한 메트릭 이름
        metrics: Vec<String>,
        message: String,
    },

    /// 메트릭 저장 권한 부족
    #[error("{message}")]
    Permission {
        /// 저장이 거부된 메트릭 이름
        metrics: Vec<String>,
        message: String,
    },

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 로컬 설정 JSON 직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl PmApiError {
    /// 전송 실패를 래핑한 네트워크 에러
    pub fn network(cause: TransportError) -> Self {
        Self::Network {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    /// 응답 형식 위반
    pub fn malformed_response() -> Self {
        Self::Network {
            message: MALFORMED_RESPONSE.to_string(),
            cause: None,
        }
    }

    /// 메트릭 미발견 에러. `message`가 없으면 기본 문구를 만든다.
    pub fn missing_metrics(metrics: Vec<String>, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            format!(
                "Cannot find metric{} {}. Please check if the PMDA is enabled.",
                plural_suffix(&metrics),
                metrics.join(", ")
            )
        });
        Self::MissingMetrics { metrics, message }
    }

    /// 저장 권한 에러. `message`가 없으면 기본 문구를 만든다.
    pub fn permission(metrics: Vec<String>, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            format!(
                "Insufficient permissions to store metric{} {}.",
                plural_suffix(&metrics),
                metrics.join(", ")
            )
        });
        Self::Permission { metrics, message }
    }

    /// 에러에 연관된 메트릭 이름
    pub fn metrics(&self) -> &[String] {
        match self {
            Self::MissingMetrics { metrics, .. } | Self::Permission { metrics, .. } => metrics,
            _ => &[],
        }
    }

    /// pmproxy의 "Unknown metric name" 응답인지 판별
    ///
    /// pmproxy는 구조화된 에러 코드를 주지 않으므로 에러 본문의 `message`
    /// 문자열을 검사한다.
    pub fn is_unknown_metric(&self) -> bool {
        match self {
            Self::Network {
                cause: Some(cause), ..
            } => cause
                .server_message()
                .is_some_and(|message| message.contains(UNKNOWN_METRIC_NAME)),
            _ => false,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn plural_suffix(metrics: &[String]) -> &'static str {
    if metrics.len() == 1 {
        ""
    } else {
        "s"
    }
}
