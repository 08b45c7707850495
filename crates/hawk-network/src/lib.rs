//! # hawk-network
//!
//! 모니터링 서버 네트워크 어댑터.
//! `TelemetrySource` 포트의 REST 구현과, 소스 호스트 도달 가능성 기반의
//! 온라인/오프라인 상태 관리를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use hawk_network::http_client::HttpTelemetrySource;
//! use hawk_network::connectivity::{ConnectivityManager, ReachabilityMonitor, TcpProbe};
//! ```

pub mod connectivity;
pub mod http_client;
