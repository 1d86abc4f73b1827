use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use hyper_util::rt::TokioIo;
use crate::{
    routing::Protocol,
    settings::Settings,
    tls::TlsConfig,
};
use tracing::{debug, error, info};
use super::handler::RequestRouter;
use super::Result;

pub struct ServerListener {
    http_listener: TcpListener,
    https_config: Option<TlsConfig>,
}

impl ServerListener {
    pub async fn bind(settings: &Settings) -> Result<Self> {
        let http_addr = settings.server.http_addr();
        let http_listener = TcpListener::bind(&http_addr)
            .await
            .map_err(|e| {
                error!(error = %e, addr = %http_addr, "HTTP 포트 바인딩 실패");
                e
            })?;

        info!(addr = %http_addr, "HTTP 리스너 시작");

        let https_config = if settings.server.https_enabled {
            Some(TlsConfig::new(&settings.tls, &settings.server.https_addr()).await?)
        } else {
            info!(
                port = settings.server.https_port,
                "HTTPS 리스너 비활성화 (server.https_enabled = false)"
            );
            None
        };

        Ok(Self::from_parts(http_listener, https_config))
    }

    pub fn from_parts(http_listener: TcpListener, https_config: Option<TlsConfig>) -> Self {
        Self {
            http_listener,
            https_config,
        }
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        Ok(self.http_listener.local_addr()?)
    }

    pub fn https_addr(&self) -> Result<Option<SocketAddr>> {
        match &self.https_config {
            Some(config) => Ok(Some(config.listener.local_addr()?)),
            None => Ok(None),
        }
    }

    /// `shutdown`이 완료될 때까지 연결을 받습니다.
    pub async fn run<F>(self, router: Arc<RequestRouter>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("리스너 종료");
                    return Ok(());
                }

                result = self.http_listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "HTTP 연결 수락");
                            let router = router.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                if let Err(err) = router.handle_connection(Protocol::Http, io).await {
                                    error!(error = %err, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "HTTP 연결 수락 실패");
                        }
                    }
                }

                result = async {
                    match &self.https_config {
                        Some(config) => config.listener.accept().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match (result, &self.https_config) {
                        (Ok((stream, peer)), Some(config)) => {
                            debug!(peer = %peer, "HTTPS 연결 수락");
                            let router = router.clone();
                            let acceptor = config.acceptor.clone();

                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        let io = TokioIo::new(tls_stream);
                                        if let Err(err) = router.handle_connection(Protocol::Https, io).await {
                                            error!(error = %err, "HTTPS 연결 처리 실패");
                                        }
                                    }
                                    Err(e) => {
                                        error!(error = %e, peer = %peer, "TLS 핸드쉐이크 실패");
                                    }
                                }
                            });
                        }
                        (Ok(_), None) => {}
                        (Err(e), _) => {
                            error!(error = %e, "HTTPS 연결 수락 실패");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ServerSettings;

    #[tokio::test]
    async fn test_bind_without_https() {
        let settings = Settings {
            server: ServerSettings {
                bind_address: "127.0.0.1".to_string(),
                http_port: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let listener = ServerListener::bind(&settings).await.unwrap();
        assert!(listener.http_addr().unwrap().ip().is_loopback());
        assert_eq!(listener.https_addr().unwrap(), None);
    }
}
