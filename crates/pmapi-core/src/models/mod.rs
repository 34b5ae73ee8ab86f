//! PMAPI 도메인 모델.
//!
//! pmproxy REST 응답 구조체와 요청 옵션을 정의한다.
//! 모든 응답 모델은 요청마다 새로 만들어지는 불변 스냅샷이다.

pub mod context;
pub mod fetch;
pub mod instance;
pub mod metric;
pub mod request;
