use local_dev_proxy::{
    logging::init_logging,
    server::{self, ServerManager},
    settings::Settings,
};
use tracing::{error, info};

async fn run(settings: Settings) -> server::Result<()> {
    info!(
        http = %settings.server.http_addr(),
        https = settings.server.https_enabled,
        target_domain = %settings.backend.target_domain,
        "프록시 시작"
    );

    ServerManager::with_defaults(settings)?.run().await
}

#[tokio::main]
async fn main() {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    let guard = init_logging(&settings.logging);

    let code = match run(settings).await {
        Ok(()) => {
            info!("프록시 종료");
            0
        }
        Err(e) => {
            error!(error = %e, "서버 실행 실패");
            1
        }
    };

    // 버퍼된 로그를 모두 기록한 뒤 종료
    drop(guard);
    std::process::exit(code);
}
