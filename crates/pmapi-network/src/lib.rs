//! # pmapi-network
//!
//! pmproxy PMAPI REST 네트워크 어댑터.
//! reqwest 전송 위에서 컨텍스트 생성, 메타데이터/인스턴스 도메인/값 조회를 수행한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use pmapi_core::ports::pmapi::PmApi;
//! use pmapi_network::client::PmApiClient;
//! use pmapi_network::transport::ReqwestTransport;
//!
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
//! let client = PmApiClient::new(transport, DatasourceRequestOptions::default());
//! let ctx = client.create_context("http://localhost:44322", None).await?;
//! ```

pub mod client;
pub mod transport;

pub use client::PmApiClient;
pub use transport::ReqwestTransport;
