use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::rustls::{self, Certificate, PrivateKey};
use tokio_rustls::TlsAcceptor;
use tracing::{error, info};

use crate::server::{error::Error, Result};
use crate::settings::TlsSettings;

/// HTTPS 리스너와 TLS 종료에 쓰이는 acceptor
pub struct TlsConfig {
    pub acceptor: TlsAcceptor,
    pub listener: TcpListener,
}

impl TlsConfig {
    pub async fn new(settings: &TlsSettings, addr: &str) -> Result<Self> {
        let (cert_path, key_path) = match (&settings.cert_path, &settings.key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => return Err(Error::Tls("인증서 또는 개인키 경로가 지정되지 않았습니다".to_string())),
        };

        let acceptor = Self::load_acceptor(cert_path, key_path)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(error = %e, addr = %addr, "HTTPS 포트 바인딩 실패");
            e
        })?;

        info!(addr = %addr, "HTTPS 리스너 시작");
        Ok(Self { acceptor, listener })
    }

    pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
        let config = Self::load_tls_config(cert_path, key_path)?;
        Ok(TlsAcceptor::from(Arc::new(config)))
    }

    fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<rustls::ServerConfig> {
        let certs: Vec<Certificate> = read_pem(cert_path, |reader| rustls_pemfile::certs(reader))?
            .into_iter()
            .map(Certificate)
            .collect();
        if certs.is_empty() {
            return Err(Error::Tls(format!("인증서를 찾을 수 없음: {}", cert_path.display())));
        }

        let mut keys = read_pem(key_path, |reader| rustls_pemfile::pkcs8_private_keys(reader))?;
        if keys.is_empty() {
            keys = read_pem(key_path, |reader| rustls_pemfile::rsa_private_keys(reader))?;
        }
        let key = keys
            .into_iter()
            .next()
            .ok_or_else(|| Error::Tls(format!("개인키를 찾을 수 없음: {}", key_path.display())))?;

        let mut config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(certs, PrivateKey(key))
            .map_err(|e| Error::Tls(e.to_string()))?;
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(config)
    }
}

fn read_pem<F>(path: &Path, parse: F) -> Result<Vec<Vec<u8>>>
where
    F: FnOnce(&mut BufReader<File>) -> std::io::Result<Vec<Vec<u8>>>,
{
    let file = File::open(path)
        .map_err(|e| Error::Tls(format!("{} 열기 실패: {}", path.display(), e)))?;
    parse(&mut BufReader::new(file))
        .map_err(|e| Error::Tls(format!("{} 파싱 실패: {}", path.display(), e)))
}
