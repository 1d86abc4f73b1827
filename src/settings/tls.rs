use std::{env, path::{Path, PathBuf}};
use serde::Deserialize;
use tokio::fs;
use super::SettingsError;

/// HTTPS 리스너에 넘겨지는 인증서/개인키 경로
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsSettings {
    /// 인증서 체인 (PEM)
    pub cert_path: Option<PathBuf>,

    /// 개인키 (PEM, PKCS#8 또는 RSA)
    pub key_path: Option<PathBuf>,
}

impl TlsSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            cert_path: env::var("PROXY_TLS_CERT").map(PathBuf::from).ok(),
            key_path: env::var("PROXY_TLS_KEY").map(PathBuf::from).ok(),
        })
    }

    /// HTTPS 활성화 시 인증서와 키 파일이 지정되어 있고 읽을 수 있는지 검증
    pub async fn validate(&self) -> Result<(), SettingsError> {
        let cert_path = self.cert_path.as_ref().ok_or_else(|| SettingsError::EnvVarMissing {
            var_name: "PROXY_TLS_CERT".to_string(),
        })?;

        let key_path = self.key_path.as_ref().ok_or_else(|| SettingsError::EnvVarMissing {
            var_name: "PROXY_TLS_KEY".to_string(),
        })?;

        check_readable(cert_path, "인증서 파일을 찾을 수 없습니다").await?;
        check_readable(key_path, "개인키 파일을 찾을 수 없습니다").await?;

        Ok(())
    }
}

async fn check_readable(path: &Path, not_found: &str) -> Result<(), SettingsError> {
    if !path.exists() {
        return Err(SettingsError::FileError {
            path: path.to_string_lossy().to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, not_found.to_string()),
        });
    }

    fs::read(path).await.map_err(|e| SettingsError::FileError {
        path: path.to_string_lossy().to_string(),
        error: e,
    })?;

    Ok(())
}
