use std::fmt;
use std::time::Duration;

/// 백엔드 연결/요청 에러
#[derive(Debug)]
pub enum BackendError {
    /// TCP 연결 실패 (연결 거부, DNS 실패 등)
    Connect {
        target: String,
        source: std::io::Error,
    },
    /// TLS SNI로 쓸 수 없는 호스트 이름
    InvalidServerName {
        host: String,
    },
    /// TLS 핸드쉐이크 실패
    Tls {
        target: String,
        source: std::io::Error,
    },
    /// HTTP/1 핸드쉐이크 실패
    Handshake {
        target: String,
        source: hyper::Error,
    },
    /// 요청 전송 또는 응답 수신 실패
    Request {
        target: String,
        source: hyper::Error,
    },
    InvalidRequest {
        target: String,
        reason: String,
    },
    Timeout {
        target: String,
        timeout: Duration,
    },
    /// CA 번들 로드 실패
    CaFile {
        path: String,
        error: std::io::Error,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { target, source } =>
                write!(f, "백엔드 {} 연결 실패: {}", target, source),
            Self::InvalidServerName { host } =>
                write!(f, "TLS 서버 이름으로 사용할 수 없는 호스트: {}", host),
            Self::Tls { target, source } =>
                write!(f, "백엔드 {} TLS 핸드쉐이크 실패: {}", target, source),
            Self::Handshake { target, source } =>
                write!(f, "백엔드 {} HTTP 핸드쉐이크 실패: {}", target, source),
            Self::Request { target, source } =>
                write!(f, "백엔드 {} 요청 실패: {}", target, source),
            Self::InvalidRequest { target, reason } =>
                write!(f, "백엔드 {} 요청 생성 실패: {}", target, reason),
            Self::Timeout { target, timeout } =>
                write!(f, "백엔드 {} 타임아웃 ({}ms)", target, timeout.as_millis()),
            Self::CaFile { path, error } =>
                write!(f, "CA 파일 {} 오류: {}", path, error),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } | Self::Tls { source, .. } => Some(source),
            Self::Handshake { source, .. } | Self::Request { source, .. } => Some(source),
            Self::CaFile { error, .. } => Some(error),
            _ => None,
        }
    }
}
