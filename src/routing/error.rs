use std::fmt;

use crate::routing::Protocol;

/// 라우팅 단계에서 발생하는 에러입니다.
///
/// 모든 라우팅 에러는 전달 전에 404 응답으로 변환됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Host 헤더 누락
    MissingHost,
    /// 해석할 수 없는 Host 헤더
    InvalidHost {
        host: String,
        reason: String,
    },
    /// fallback을 거쳐도 요청 프로토콜의 포트가 없음
    UnknownHost {
        host: String,
        protocol: Protocol,
    },
    /// 백엔드 헬스 체크 실패
    HostUnreachable {
        target: String,
    },
}

impl RoutingError {
    /// 404 응답 상태 줄에 쓰이는 사유 문구
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            RoutingError::HostUnreachable { .. } => "Host unreachable",
            RoutingError::MissingHost
            | RoutingError::InvalidHost { .. }
            | RoutingError::UnknownHost { .. } => "Unknown host",
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::MissingHost =>
                write!(f, "Host 헤더가 누락됨"),
            RoutingError::InvalidHost { host, reason } =>
                write!(f, "유효하지 않은 호스트 '{}': {}", host, reason),
            RoutingError::UnknownHost { host, protocol } =>
                write!(f, "정의되지 않은 호스트 '{}' ({} 포트 없음)", host, protocol),
            RoutingError::HostUnreachable { target } =>
                write!(f, "백엔드 {}에 연결할 수 없음", target),
        }
    }
}

impl std::error::Error for RoutingError {}
