use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::routing::{HostResolver, HostTable, FALLBACK_KEY};
use super::{Result, SettingsError};

/// 호스트 테이블 파일을 읽습니다.
///
/// 확장자가 `.json`이면 JSON, 그 외에는 TOML로 파싱합니다.
pub async fn load_host_table<P: AsRef<Path>>(path: P) -> Result<HostTable> {
    let path = path.as_ref();
    debug!("호스트 테이블 로드: {}", path.display());

    let content = fs::read_to_string(path).await.map_err(|e| SettingsError::FileError {
        path: path.to_string_lossy().to_string(),
        error: e,
    })?;

    let table = if path.extension().map_or(false, |ext| ext == "json") {
        parse_json(&content)
    } else {
        parse_toml(&content)
    }
    .map_err(|reason| SettingsError::HostTableError {
        path: path.to_string_lossy().to_string(),
        reason,
    })?;

    info!(path = %path.display(), hosts = table.len(), "호스트 테이블 로드 완료");
    Ok(table)
}

pub fn parse_json(content: &str) -> std::result::Result<HostTable, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

pub fn parse_toml(content: &str) -> std::result::Result<HostTable, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

/// 호스트 테이블의 설정 문제를 경고로 기록하고 반환합니다.
///
/// 존재하지 않는 키를 가리키는 별칭과 별칭 순환은 치명적이지 않습니다.
/// 요청 시점에 fallback으로 처리됩니다.
pub fn lint_host_table(table: &Arc<HostTable>) -> Vec<String> {
    let mut warnings = Vec::new();

    if table.is_empty() {
        warnings.push("호스트 테이블이 비어 있습니다. 모든 요청이 404로 응답됩니다".to_string());
    } else if table.fallback().is_none() {
        debug!("fallback 항목이 없습니다");
    }

    for (host, target) in table.dangling_aliases() {
        if host == FALLBACK_KEY {
            warnings.push(format!("fallback이 존재하지 않는 호스트 '{}'를 가리킵니다", target));
        } else {
            warnings.push(format!("별칭 '{}'이 존재하지 않는 호스트 '{}'를 가리킵니다", host, target));
        }
    }

    let resolver = HostResolver::new(table.clone());
    for host in resolver.find_alias_cycles() {
        warnings.push(format!("별칭 순환: '{}'", host));
    }

    for warning in &warnings {
        warn!("{}", warning);
    }

    warnings
}
