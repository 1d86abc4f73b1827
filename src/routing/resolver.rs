use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::routing::{HostEntry, HostTable, PortMap, Protocol, RoutingError, FALLBACK_KEY};

/// 한 번의 해석에서 fallback 전환 전까지 따라갈 수 있는 최대 별칭 단계 수
pub const MAX_ALIAS_HOPS: usize = 32;

/// 별칭 체인 해석 결과입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// 최종 포트 맵. `None`이면 정의된 포트가 없습니다.
    pub ports: Option<&'a PortMap>,
    /// 방문한 키 (방문 순서)
    pub chain: Vec<String>,
    pub used_fallback: bool,
    pub cycle_detected: bool,
}

impl Resolution<'_> {
    pub fn port(&self, protocol: Protocol) -> Option<u16> {
        self.ports.and_then(|ports| ports.port(protocol))
    }
}

/// apex 호스트를 포트 맵으로 해석합니다.
///
/// 별칭은 방문 집합을 가진 루프로 따라가며, 이미 방문한 키를 다시 만나거나
/// [`MAX_ALIAS_HOPS`]를 넘으면 순환으로 보고 fallback으로 전환합니다.
/// fallback은 키가 없을 때만 사용되며, 찾은 호스트에 요청 프로토콜 포트가
/// 없는 경우에는 사용되지 않습니다.
#[derive(Debug, Clone)]
pub struct HostResolver {
    table: Arc<HostTable>,
}

impl HostResolver {
    pub fn new(table: Arc<HostTable>) -> Self {
        Self { table }
    }

    pub fn resolve(&self, apex_host: &str) -> Resolution<'_> {
        let mut resolution = Resolution {
            ports: None,
            chain: Vec::new(),
            used_fallback: false,
            cycle_detected: false,
        };
        let mut visited: HashSet<String> = HashSet::new();
        let mut key = apex_host.to_string();
        let mut hops = 0;

        loop {
            if hops >= MAX_ALIAS_HOPS || visited.contains(&key) {
                resolution.cycle_detected = true;
                warn!(
                    host = %apex_host,
                    chain = ?resolution.chain,
                    "별칭 순환 감지, fallback으로 전환"
                );
                if key == FALLBACK_KEY || visited.contains(FALLBACK_KEY) {
                    return resolution;
                }
                key = FALLBACK_KEY.to_string();
                resolution.used_fallback = true;
                hops = 0;
                continue;
            }

            visited.insert(key.clone());
            resolution.chain.push(key.clone());
            hops += 1;

            match self.table.get(&key) {
                Some(HostEntry::Ports(ports)) => {
                    resolution.ports = Some(ports);
                    return resolution;
                }
                Some(HostEntry::Alias(target)) => {
                    debug!(from = %key, to = %target, "별칭 따라가기");
                    key = target.clone();
                }
                None => {
                    if key == FALLBACK_KEY || visited.contains(FALLBACK_KEY) {
                        return resolution;
                    }
                    debug!(host = %key, "등록되지 않은 호스트, fallback 사용");
                    key = FALLBACK_KEY.to_string();
                    resolution.used_fallback = true;
                }
            }
        }
    }

    /// apex 호스트와 프로토콜에 해당하는 포트를 찾습니다.
    pub fn port_for(&self, apex_host: &str, protocol: Protocol) -> Result<u16, RoutingError> {
        self.resolve(apex_host)
            .port(protocol)
            .ok_or_else(|| RoutingError::UnknownHost {
                host: apex_host.to_string(),
                protocol,
            })
    }

    /// 해석 중 순환이 감지되는 키 목록 (정렬됨)
    pub fn find_alias_cycles(&self) -> Vec<String> {
        let mut cycles: Vec<String> = self
            .table
            .hosts()
            .into_iter()
            .filter(|host| matches!(self.table.get(host), Some(HostEntry::Alias(_))))
            .filter(|host| self.resolve(host).cycle_detected)
            .map(str::to_string)
            .collect();
        cycles.sort();
        cycles
    }
}
