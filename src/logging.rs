use std::path::Path;
use std::time::Instant;

use tracing::{error, info, span, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, fmt::time::UtcTime, EnvFilter};

use crate::routing::{Protocol, ResolvedTarget};
use crate::settings::{LogFormat, LogOutput, LogSettings};

/// 로깅 초기화
///
/// `RUST_LOG`가 있으면 설정된 레벨보다 우선합니다. 반환된 guard가 살아있는
/// 동안만 버퍼된 로그가 기록되므로 `main`에서 끝까지 들고 있어야 합니다.
pub fn init_logging(settings: &LogSettings) -> WorkerGuard {
    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::File(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "proxy.log".to_string());
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, file_name))
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_string().to_lowercase()));

    let timer = UtcTime::new(time::format_description::well_known::Rfc3339);
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(true)
        .with_writer(writer);

    let result = match settings.format {
        LogFormat::Text => builder.with_thread_ids(true).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    if let Err(e) = result {
        eprintln!("로깅 초기화 실패: {}", e);
    }

    guard
}

/// 요청 하나의 처리 결과 기록
#[derive(Debug)]
pub struct RequestLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub host: String,
    pub protocol: Option<Protocol>,
    pub target: Option<String>,
    pub status_code: u16,
    pub duration_ms: u64,
    pub error: Option<String>,
    started: Instant,
}

impl RequestLog {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            method: String::new(),
            path: String::new(),
            host: String::new(),
            protocol: None,
            target: None,
            status_code: 0,
            duration_ms: 0,
            error: None,
            started: Instant::now(),
        }
    }

    pub fn with_request<B>(&mut self, protocol: Protocol, req: &hyper::Request<B>) {
        self.protocol = Some(protocol);
        self.method = req.method().to_string();
        self.path = req.uri().path().to_string();
        if let Some(host) = req.headers().get(hyper::header::HOST) {
            self.host = host.to_str().unwrap_or_default().to_string();
        }
    }

    pub fn with_target(&mut self, target: &ResolvedTarget) {
        self.target = Some(target.url.clone());
    }

    pub fn with_response(&mut self, status: hyper::StatusCode) {
        self.status_code = status.as_u16();
        self.duration_ms = self.started.elapsed().as_millis() as u64;
    }

    pub fn with_error(&mut self, error: impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }
}

pub fn log_request(log: &RequestLog) {
    let level = if log.error.is_some() && log.status_code >= 500 {
        Level::ERROR
    } else if log.status_code >= 400 {
        Level::WARN
    } else {
        Level::INFO
    };

    let protocol = log.protocol.map(|p| p.marker()).unwrap_or("-");
    let span = span!(
        Level::INFO,
        "request",
        request_id = %log.request_id,
        protocol = %protocol,
        method = %log.method,
        path = %log.path,
        host = %log.host,
        status = %log.status_code,
        duration_ms = %log.duration_ms
    );
    let _enter = span.enter();

    match level {
        Level::ERROR => error!(target_url = ?log.target, error = ?log.error, "요청 처리 실패"),
        Level::WARN => warn!(target_url = ?log.target, error = ?log.error, "요청이 에러 상태로 완료됨"),
        _ => info!(target_url = ?log.target, "요청 처리 완료"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Request, StatusCode};

    #[test]
    fn test_request_log_fields() {
        let req = Request::builder()
            .method("GET")
            .uri("/health?full=1")
            .header(hyper::header::HOST, "api.local2.dev")
            .body(())
            .unwrap();

        let mut log = RequestLog::new("req-1".to_string());
        log.with_request(Protocol::Https, &req);
        log.with_response(StatusCode::NOT_FOUND);
        log.with_error("Unknown host");

        assert_eq!(log.method, "GET");
        assert_eq!(log.path, "/health");
        assert_eq!(log.host, "api.local2.dev");
        assert_eq!(log.protocol, Some(Protocol::Https));
        assert_eq!(log.status_code, 404);
        assert_eq!(log.error.as_deref(), Some("Unknown host"));
        log_request(&log);
    }
}
