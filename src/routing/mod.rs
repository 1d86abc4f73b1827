//! 호스트 테이블 기반 라우팅 해석을 담당하는 핵심 모듈입니다.
//!
//! 요청의 `Host` 헤더를 서브도메인과 apex 호스트로 분리하고, apex 호스트를
//! 별칭과 fallback 규칙에 따라 포트로 해석한 뒤 백엔드 대상 URL을 만듭니다.

mod error;
mod host;
mod resolver;
mod table;
mod target;

pub use error::RoutingError;
pub use host::{HostInfo, TargetComposer, DEFAULT_TARGET_DOMAIN};
pub use resolver::{HostResolver, Resolution, MAX_ALIAS_HOPS};
pub use table::{HostEntry, HostTable, PortMap, FALLBACK_KEY};
pub use target::{Protocol, ResolvedTarget};
