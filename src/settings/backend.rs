use std::{env, path::PathBuf, time::Duration};
use serde::Deserialize;
use super::{server::parse_env_var, SettingsError};
use crate::routing::DEFAULT_TARGET_DOMAIN;

/// 백엔드 헬스 체크와 전달에 쓰이는 설정
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// 대상 URL의 기본 도메인 (기본값: local.dev)
    #[serde(default = "default_target_domain")]
    pub target_domain: String,

    /// 헬스 체크 타임아웃 (밀리초)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// HTTPS 백엔드 인증서 검증 여부
    #[serde(default)]
    pub tls_verify: bool,

    /// 인증서 검증 시 신뢰할 CA 번들 (PEM)
    pub ca_path: Option<PathBuf>,
}

fn default_target_domain() -> String { DEFAULT_TARGET_DOMAIN.to_string() }
fn default_probe_timeout_ms() -> u64 { 3000 }

impl BackendSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            target_domain: env::var("PROXY_TARGET_DOMAIN").unwrap_or_else(|_| default_target_domain()),
            probe_timeout_ms: parse_env_var("PROXY_PROBE_TIMEOUT_MS", default_probe_timeout_ms)?,
            tls_verify: parse_env_var("PROXY_BACKEND_TLS_VERIFY", || false)?,
            ca_path: env::var("PROXY_BACKEND_CA").map(PathBuf::from).ok(),
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let domain = self.target_domain.trim();
        if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
            return Err(SettingsError::InvalidConfig(format!(
                "잘못된 대상 도메인: '{}'",
                self.target_domain
            )));
        }

        if self.probe_timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "probe_timeout_ms는 0보다 커야 합니다".to_string(),
            ));
        }

        if self.tls_verify && self.ca_path.is_none() {
            return Err(SettingsError::EnvVarMissing {
                var_name: "PROXY_BACKEND_CA".to_string(),
            });
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            target_domain: default_target_domain(),
            probe_timeout_ms: default_probe_timeout_ms(),
            tls_verify: false,
            ca_path: None,
        }
    }
}
