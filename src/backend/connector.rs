use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::SystemTime;

use hyper::body::Body;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{
    self,
    client::{ServerCertVerified, ServerCertVerifier},
    Certificate, ClientConfig, RootCertStore, ServerName,
};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use crate::routing::{Protocol, ResolvedTarget};
use crate::settings::BackendSettings;
use super::BackendError;

/// 대상 백엔드로 HTTP/1.1 연결을 엽니다.
///
/// 헬스 체크와 요청 전달이 같은 커넥터를 사용합니다. 요청마다 새 연결을 열며
/// 연결 드라이버는 별도 태스크에서 실행됩니다.
#[derive(Clone)]
pub struct BackendConnector {
    tls: TlsConnector,
}

impl BackendConnector {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let config = Self::load_client_config(settings)?;
        Ok(Self {
            tls: TlsConnector::from(Arc::new(config)),
        })
    }

    fn load_client_config(settings: &BackendSettings) -> Result<ClientConfig, BackendError> {
        let mut roots = RootCertStore::empty();

        if let Some(ca_path) = &settings.ca_path {
            let ca_error = |error: std::io::Error| BackendError::CaFile {
                path: ca_path.to_string_lossy().to_string(),
                error,
            };
            let ca_file = File::open(ca_path).map_err(ca_error)?;
            let certs = rustls_pemfile::certs(&mut BufReader::new(ca_file)).map_err(ca_error)?;
            let (added, ignored) = roots.add_parsable_certificates(&certs[..]);
            info!(path = %ca_path.display(), added, ignored, "백엔드 CA 인증서 로드");
        }

        let mut config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();

        if !settings.tls_verify {
            warn!("HTTPS 백엔드 인증서 검증이 비활성화되어 있습니다");
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(AcceptAnyServerCert));
        }

        config.alpn_protocols = vec![b"http/1.1".to_vec()];
        Ok(config)
    }

    /// 대상에 연결하고 요청 송신자를 반환합니다.
    pub async fn connect<B>(&self, target: &ResolvedTarget) -> Result<SendRequest<B>, BackendError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| BackendError::Connect {
                target: target.url.clone(),
                source: e,
            })?;

        match target.protocol {
            Protocol::Http => handshake(TokioIo::new(stream), target).await,
            Protocol::Https => {
                let server_name = ServerName::try_from(target.host.as_str()).map_err(|_| {
                    BackendError::InvalidServerName {
                        host: target.host.clone(),
                    }
                })?;
                let tls_stream = self
                    .tls
                    .connect(server_name, stream)
                    .await
                    .map_err(|e| BackendError::Tls {
                        target: target.url.clone(),
                        source: e,
                    })?;
                handshake(TokioIo::new(tls_stream), target).await
            }
        }
    }
}

async fn handshake<I, B>(io: I, target: &ResolvedTarget) -> Result<SendRequest<B>, BackendError>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (sender, connection) = http1::handshake(io)
        .await
        .map_err(|e| BackendError::Handshake {
            target: target.url.clone(),
            source: e,
        })?;

    let url = target.url.clone();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(target = %url, error = %e, "백엔드 연결 종료");
        }
    });

    Ok(sender)
}

/// 로컬 개발용 자체 서명 인증서를 허용하는 검증기
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}
