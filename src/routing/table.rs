use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU16;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::routing::Protocol;

/// 조회 키가 없을 때 사용할 항목을 가리키는 예약 키
pub const FALLBACK_KEY: &str = "__fallback";

/// 프로토콜별 백엔드 포트입니다.
///
/// 필드가 없으면 해당 호스트가 그 프로토콜을 지원하지 않는다는 뜻입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortMap {
    #[serde(default)]
    pub http: Option<NonZeroU16>,
    #[serde(default)]
    pub https: Option<NonZeroU16>,
}

impl PortMap {
    /// 포트 값으로 PortMap을 만듭니다. `0`은 "지원하지 않음"으로 취급됩니다.
    pub fn new(http: Option<u16>, https: Option<u16>) -> Self {
        Self {
            http: http.and_then(NonZeroU16::new),
            https: https.and_then(NonZeroU16::new),
        }
    }

    pub fn port(&self, protocol: Protocol) -> Option<u16> {
        match protocol {
            Protocol::Http => self.http,
            Protocol::Https => self.https,
        }
        .map(NonZeroU16::get)
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

/// 호스트 테이블의 값: 포트 맵 또는 다른 키를 가리키는 별칭
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEntry {
    Ports(PortMap),
    Alias(String),
}

impl HostEntry {
    pub fn ports(http: Option<u16>, https: Option<u16>) -> Self {
        HostEntry::Ports(PortMap::new(http, https))
    }

    pub fn alias(target: impl Into<String>) -> Self {
        HostEntry::Alias(target.into().to_lowercase())
    }
}

struct HostEntryVisitor;

impl<'de> Visitor<'de> for HostEntryVisitor {
    type Value = HostEntry;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a port map ({ http, https }) or an alias host name")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if value.is_empty() {
            return Err(E::custom("alias must not be empty"));
        }
        Ok(HostEntry::alias(value))
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        PortMap::deserialize(de::value::MapAccessDeserializer::new(map)).map(HostEntry::Ports)
    }
}

impl<'de> Deserialize<'de> for HostEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(HostEntryVisitor)
    }
}

/// apex 도메인에서 포트 맵 또는 별칭으로의 불변 매핑입니다.
///
/// 시작 시 한 번 만들어진 뒤 `Arc`로 공유되며 변경되지 않습니다.
/// 키는 소문자로 정규화되며, 정규화 후 겹치는 키가 있으면 테이블을 만들 수 없습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, HostEntry>")]
pub struct HostTable {
    entries: HashMap<String, HostEntry>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, HostEntry)>,
        K: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, entry)| (key.into().to_lowercase(), entry))
                .collect(),
        }
    }

    /// 대소문자만 다른 키가 있으면 두 키를 담은 에러를 반환합니다.
    pub fn try_from_entries<I, K>(entries: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (K, HostEntry)>,
        K: Into<String>,
    {
        let mut normalized: HashMap<String, (String, HostEntry)> = HashMap::new();

        for (key, entry) in entries {
            let key = key.into();
            let lower = key.to_lowercase();
            if let Some((existing, _)) = normalized.get(&lower) {
                let (first, second) = if *existing <= key {
                    (existing.as_str(), key.as_str())
                } else {
                    (key.as_str(), existing.as_str())
                };
                return Err(format!(
                    "호스트 키 '{}'와 '{}'가 같은 키 '{}'로 정규화됩니다",
                    first, second, lower
                ));
            }
            normalized.insert(lower, (key, entry));
        }

        Ok(Self {
            entries: normalized
                .into_iter()
                .map(|(key, (_, entry))| (key, entry))
                .collect(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&HostEntry> {
        self.entries.get(key)
    }

    pub fn fallback(&self) -> Option<&HostEntry> {
        self.entries.get(FALLBACK_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 예약 키를 제외한 등록 호스트 목록 (정렬됨)
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|key| *key != FALLBACK_KEY)
            .collect();
        hosts.sort_unstable();
        hosts
    }

    /// 테이블에 없는 키를 가리키는 별칭 목록: `(별칭 키, 대상)`
    pub fn dangling_aliases(&self) -> Vec<(&str, &str)> {
        let mut dangling: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                HostEntry::Alias(target) if !self.entries.contains_key(target) => {
                    Some((key.as_str(), target.as_str()))
                }
                _ => None,
            })
            .collect();
        dangling.sort_unstable();
        dangling
    }
}

impl TryFrom<HashMap<String, HostEntry>> for HostTable {
    type Error = String;

    fn try_from(entries: HashMap<String, HostEntry>) -> Result<Self, Self::Error> {
        Self::try_from_entries(entries)
    }
}
