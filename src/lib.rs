//! 로컬 개발용 리버스 프록시입니다.
//!
//! `Host` 헤더의 apex 도메인으로 호스트 테이블에서 포트를 찾고,
//! `<protocol>://[<서브도메인>.]local.dev:<port>` 대상에 헬스 체크를 한 뒤
//! 요청을 전달합니다.
//!
//! # 주요 기능
//!
//! - 별칭과 fallback을 지원하는 호스트 테이블
//! - HTTP/HTTPS 리스너
//! - 전달 전 백엔드 헬스 체크와 404 응답 ("Unknown host" / "Host unreachable")
//!
//! # 예제
//!
//! ```
//! use local_dev_proxy::routing::{HostEntry, HostResolver, HostTable, Protocol, TargetComposer};
//! use std::sync::Arc;
//!
//! let table = HostTable::from_entries(vec![
//!     ("local1.dev", HostEntry::ports(Some(801), None)),
//!     ("local3.dev", HostEntry::alias("local1.dev")),
//!     ("__fallback", HostEntry::alias("local1.dev")),
//! ]);
//! let resolver = HostResolver::new(Arc::new(table));
//! let composer = TargetComposer::default();
//!
//! let host = composer.split_host("api.local3.dev").unwrap();
//! let port = resolver.port_for(&host.apex, Protocol::Http).unwrap();
//! assert_eq!(
//!     composer.compose_target(Protocol::Http, &host.subdomains, port),
//!     "http://api.local.dev:801"
//! );
//! ```

pub mod backend;
pub mod logging;
pub mod proxy;
pub mod routing;
pub mod server;
pub mod settings;
pub mod tls;
