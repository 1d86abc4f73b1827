use crate::routing::{Protocol, ResolvedTarget, RoutingError};

/// 백엔드 대상 URL이 사용하는 기본 도메인
pub const DEFAULT_TARGET_DOMAIN: &str = "local.dev";

/// `Host` 헤더를 서브도메인과 apex 호스트로 나눈 결과입니다.
///
/// # 필드
///
/// * `subdomains` - apex 앞의 레이블 (원래 순서)
/// * `apex` - 마지막 두 레이블 (예: "local2.dev")
/// * `port` - 헤더에 포함된 포트 (있는 경우)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostInfo {
    pub subdomains: Vec<String>,
    pub apex: String,
    pub port: Option<u16>,
}

impl HostInfo {
    /// 호스트 헤더 값에서 HostInfo를 생성합니다.
    ///
    /// 포트와 FQDN의 마지막 점은 제거하고 소문자로 정규화합니다.
    /// 레이블이 두 개 미만이거나 빈 레이블이 있으면 `InvalidHost`를 반환합니다.
    ///
    /// # 예제
    ///
    /// ```
    /// use local_dev_proxy::routing::HostInfo;
    ///
    /// let info = HostInfo::from_header_value("api.v2.local2.dev:8080").unwrap();
    /// assert_eq!(info.subdomains, vec!["api", "v2"]);
    /// assert_eq!(info.apex, "local2.dev");
    /// assert_eq!(info.port, Some(8080));
    /// ```
    pub fn from_header_value(value: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: &str| RoutingError::InvalidHost {
            host: value.to_string(),
            reason: reason.to_string(),
        };

        let (name, port) = match value.rsplit_once(':') {
            Some((name, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| invalid("잘못된 포트"))?;
                (name, Some(port))
            }
            None => (value, None),
        };

        let name = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();
        let labels: Vec<&str> = name.split('.').collect();

        if labels.len() < 2 {
            return Err(invalid("apex 도메인에는 두 개 이상의 레이블이 필요합니다"));
        }
        if labels.iter().any(|label| label.is_empty()) {
            return Err(invalid("빈 레이블"));
        }

        let split = labels.len() - 2;
        Ok(HostInfo {
            subdomains: labels[..split].iter().map(|label| label.to_string()).collect(),
            apex: labels[split..].join("."),
            port,
        })
    }

    /// 서브도메인 접두사 (`"a.b."`, 서브도메인이 없으면 빈 문자열)
    pub fn subdomain_prefix(&self) -> String {
        subdomain_prefix(&self.subdomains)
    }
}

fn subdomain_prefix(subdomains: &[String]) -> String {
    if subdomains.is_empty() {
        String::new()
    } else {
        format!("{}.", subdomains.join("."))
    }
}

/// 요청 호스트에서 백엔드 대상 URL을 만듭니다.
///
/// 대상은 항상 고정된 기본 도메인을 사용합니다. 요청한 apex 호스트는 테이블
/// 조회에만 쓰이고 서브도메인 접두사만 대상 URL에 남습니다.
#[derive(Debug, Clone)]
pub struct TargetComposer {
    domain: String,
}

impl TargetComposer {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn split_host(&self, value: &str) -> Result<HostInfo, RoutingError> {
        HostInfo::from_header_value(value)
    }

    /// 백엔드 호스트 이름: `[<서브도메인>.]<기본 도메인>`
    pub fn backend_host(&self, subdomains: &[String]) -> String {
        format!("{}{}", subdomain_prefix(subdomains), self.domain)
    }

    /// `<protocol>://[<서브도메인>.]<기본 도메인>:<port>`
    pub fn compose_target(&self, protocol: Protocol, subdomains: &[String], port: u16) -> String {
        format!("{}://{}:{}", protocol.scheme(), self.backend_host(subdomains), port)
    }

    pub fn resolve_target(&self, protocol: Protocol, host: HostInfo, port: u16) -> ResolvedTarget {
        ResolvedTarget {
            protocol,
            host: self.backend_host(&host.subdomains),
            url: self.compose_target(protocol, &host.subdomains, port),
            subdomains: host.subdomains,
            apex_host: host.apex,
            port,
        }
    }
}

impl Default for TargetComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_DOMAIN)
    }
}
