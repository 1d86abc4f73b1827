use serde::Deserialize;
use std::env;
use super::SettingsError;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// 리스너 바인드 주소 (기본값: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP 포트 (기본값: 80)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// HTTPS 활성화 여부
    #[serde(default)]
    pub https_enabled: bool,

    /// HTTPS 포트 (기본값: 443)
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 80 }
fn default_https_port() -> u16 { 443 }

/// 환경 변수를 파싱합니다. 변수가 없으면 `default`를 사용합니다.
pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: "".to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    const MIN_PORT: u16 = 1;
    const MAX_PORT: u16 = 65535;

    fn parse_port(name: &str, default: u16) -> Result<u16, SettingsError> {
        let value = env::var(name).unwrap_or_else(|_| default.to_string());
        let port = value.parse::<u16>().map_err(|_| SettingsError::EnvVarInvalid {
            var_name: name.to_string(),
            value: value.clone(),
            reason: format!("포트는 {}-{} 범위여야 합니다", Self::MIN_PORT, Self::MAX_PORT),
        })?;

        Self::check_port(name, port)?;
        Ok(port)
    }

    fn check_port(name: &str, port: u16) -> Result<(), SettingsError> {
        if port < Self::MIN_PORT {
            return Err(SettingsError::EnvVarInvalid {
                var_name: name.to_string(),
                value: port.to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            bind_address: env::var("PROXY_BIND_ADDRESS").unwrap_or_else(|_| default_bind_address()),
            http_port: Self::parse_port("PROXY_HTTP_PORT", default_http_port())?,
            https_enabled: parse_env_var::<bool, _>("PROXY_HTTPS_ENABLED", || false)?,
            https_port: Self::parse_port("PROXY_HTTPS_PORT", default_https_port())?,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.bind_address.trim().is_empty() {
            return Err(SettingsError::InvalidConfig("bind_address가 비어 있습니다".to_string()));
        }

        Self::check_port("server.http_port", self.http_port)?;

        if self.https_enabled {
            Self::check_port("server.https_port", self.https_port)?;

            // HTTP/HTTPS 포트 충돌 검사
            if self.http_port == self.https_port {
                return Err(SettingsError::EnvVarInvalid {
                    var_name: "PROXY_HTTP_PORT/PROXY_HTTPS_PORT".to_string(),
                    value: format!("{}/{}", self.http_port, self.https_port),
                    reason: "HTTP와 HTTPS 포트는 달라야 합니다".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn http_addr(&self) -> String {
        self.listen_addr(self.http_port)
    }

    pub fn https_addr(&self) -> String {
        self.listen_addr(self.https_port)
    }

    fn listen_addr(&self, port: u16) -> String {
        // IPv6 주소는 대괄호로 감싼다
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, port)
        } else {
            format!("{}:{}", self.bind_address, port)
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            https_enabled: false,
            https_port: default_https_port(),
        }
    }
}
