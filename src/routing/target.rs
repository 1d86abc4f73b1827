use std::fmt;

/// 리스너가 요청을 받은 프로토콜입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// URL 스킴 (`http` / `https`)
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    /// 해당 프로토콜 리스너의 기본 포트
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Http => 80,
            Protocol::Https => 443,
        }
    }

    /// 로그에 표시되는 프로토콜 마커
    pub fn marker(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// 하나의 요청에 대해 계산된 백엔드 대상입니다.
///
/// 요청 처리 흐름이 소유하며 응답이 끝나면 버려집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub protocol: Protocol,
    /// 원래 요청의 서브도메인 레이블 (순서 유지)
    pub subdomains: Vec<String>,
    /// 테이블 조회에 사용된 apex 호스트
    pub apex_host: String,
    /// 백엔드 호스트 이름 (예: `api.local.dev`)
    pub host: String,
    pub port: u16,
    /// `<protocol>://<host>:<port>` 형태의 대상 URL
    pub url: String,
}

impl ResolvedTarget {
    /// `host:port` 형태의 authority
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
