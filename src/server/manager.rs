use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};
use crate::{
    backend::{BackendConnector, HttpProbe},
    proxy::HttpForwarder,
    routing::{HostResolver, HostTable, TargetComposer},
    settings::{hosts::lint_host_table, Settings},
};
use super::{
    handler::RequestRouter,
    listener::ServerListener,
    Result,
};

pub struct ServerManager {
    pub settings: Settings,
    pub router: Arc<RequestRouter>,
}

impl ServerManager {
    pub fn new(settings: Settings, router: Arc<RequestRouter>) -> Self {
        Self { settings, router }
    }

    /// 설정으로부터 라우터와 백엔드 구성 요소를 만듭니다.
    pub fn with_defaults(settings: Settings) -> Result<Self> {
        let table = Arc::new(settings.hosts.clone());
        lint_host_table(&table);
        info!(hosts = ?table.hosts(), "호스트 테이블 로드 완료");

        let router = Arc::new(Self::build_router(&settings, table)?);
        Ok(Self::new(settings, router))
    }

    pub fn build_router(settings: &Settings, table: Arc<HostTable>) -> Result<RequestRouter> {
        let connector = BackendConnector::new(&settings.backend).map_err(|e| {
            error!(error = %e, "백엔드 커넥터 초기화 실패");
            e
        })?;

        Ok(RequestRouter::new(
            HostResolver::new(table),
            TargetComposer::new(settings.backend.target_domain.clone()),
            Arc::new(HttpProbe::new(connector.clone(), settings.backend.probe_timeout())),
            Arc::new(HttpForwarder::new(connector)),
        ))
    }

    /// Ctrl-C를 받을 때까지 서버 실행
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "종료 시그널 대기 실패");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = ServerListener::bind(&self.settings).await?;
        listener.run(self.router, shutdown).await
    }
}
