use std::{env, path::{Path, PathBuf}};
use serde::Deserialize;
use tracing::debug;
use crate::routing::HostTable;

mod server;
pub mod logging;
mod tls;
mod error;
mod backend;
pub mod hosts;

pub use server::ServerSettings;
pub use logging::{LogFormat, LogOutput, LogSettings};
pub use tls::TlsSettings;
pub use backend::BackendSettings;
pub use error::SettingsError;

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::parse_env_var;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    // 서버 설정
    #[serde(default)]
    pub server: ServerSettings,

    // 로깅 설정
    #[serde(default)]
    pub logging: LogSettings,

    // TLS 설정
    #[serde(default)]
    pub tls: TlsSettings,

    // 백엔드 헬스 체크/전달 설정
    #[serde(default)]
    pub backend: BackendSettings,

    /// 별도 호스트 테이블 파일 (지정 시 `[hosts]`를 대체)
    #[serde(default)]
    pub hosts_file: Option<PathBuf>,

    /// 인라인 호스트 테이블
    #[serde(default)]
    pub hosts: HostTable,
}

impl Settings {
    /// `PROXY_CONFIG_FILE`이 있으면 TOML 파일에서, 없으면 환경 변수에서 설정을 읽습니다.
    pub async fn load() -> Result<Self> {
        let mut settings = if let Ok(config_path) = env::var("PROXY_CONFIG_FILE") {
            Self::from_toml_file(&config_path).await?
        } else {
            Self::from_env()?
        };

        if let Ok(hosts_path) = env::var("PROXY_HOSTS_FILE") {
            settings.hosts_file = Some(PathBuf::from(hosts_path));
        }

        settings.load_hosts_file().await?;
        settings.validate().await?;
        Ok(settings)
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let mut settings = Self::from_toml_str(&content)?;

        // 상대 경로의 호스트 파일은 설정 파일 기준으로 해석
        if let (Some(hosts_file), Some(parent)) = (&settings.hosts_file, path.as_ref().parent()) {
            if hosts_file.is_relative() {
                settings.hosts_file = Some(parent.join(hosts_file));
            }
        }

        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SettingsError::ParseError { source: e })
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            tls: TlsSettings::from_env()?,
            backend: BackendSettings::from_env()?,
            hosts_file: None,
            hosts: HostTable::new(),
        })
    }

    /// `hosts_file`이 지정된 경우 호스트 테이블을 파일에서 다시 읽습니다.
    pub async fn load_hosts_file(&mut self) -> Result<()> {
        if let Some(path) = &self.hosts_file {
            if !self.hosts.is_empty() {
                debug!("인라인 호스트 테이블을 파일 내용으로 대체합니다");
            }
            self.hosts = hosts::load_host_table(path).await?;
        }
        Ok(())
    }

    /// 설정 유효성 검증
    pub async fn validate(&self) -> Result<()> {
        self.server.validate()?;
        if self.server.https_enabled {
            self.tls.validate().await?;
        }
        self.backend.validate()?;
        Ok(())
    }
}
