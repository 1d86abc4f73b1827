use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    backend::LivenessProbe,
    logging::{log_request, RequestLog},
    proxy::{self, Forwarder, ProxyBody},
    routing::{HostInfo, HostResolver, Protocol, ResolvedTarget, RoutingError, TargetComposer},
};

/// 요청 하나의 라우팅 흐름을 담당합니다.
///
/// Host 파싱, 포트 해석, 대상 URL 생성, 헬스 체크를 차례로 수행하고 성공하면
/// 요청을 [`Forwarder`]에 넘깁니다. 라우팅 단계의 모든 실패는 전달 전에
/// 404로 끝납니다.
pub struct RequestRouter {
    resolver: HostResolver,
    composer: TargetComposer,
    probe: Arc<dyn LivenessProbe>,
    forwarder: Arc<dyn Forwarder>,
}

impl RequestRouter {
    pub fn new(
        resolver: HostResolver,
        composer: TargetComposer,
        probe: Arc<dyn LivenessProbe>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            resolver,
            composer,
            probe,
            forwarder,
        }
    }

    pub fn extract_host<B>(&self, req: &Request<B>) -> Result<HostInfo, RoutingError> {
        let value = req
            .headers()
            .get(header::HOST)
            .ok_or(RoutingError::MissingHost)?;
        let value = value.to_str().map_err(|_| RoutingError::InvalidHost {
            host: String::from_utf8_lossy(value.as_bytes()).to_string(),
            reason: "ASCII가 아닌 Host 헤더".to_string(),
        })?;
        self.composer.split_host(value)
    }

    /// Host 헤더와 프로토콜로 백엔드 대상을 계산합니다. 네트워크 접근은 없습니다.
    pub fn resolve_target<B>(
        &self,
        protocol: Protocol,
        req: &Request<B>,
    ) -> Result<ResolvedTarget, RoutingError> {
        let host = self.extract_host(req)?;
        let port = self.resolver.port_for(&host.apex, protocol)?;
        Ok(self.composer.resolve_target(protocol, host, port))
    }

    /// 라우팅 후 헬스 체크를 통과한 요청만 전달합니다.
    pub async fn route(&self, protocol: Protocol, req: Request<ProxyBody>) -> Response<ProxyBody> {
        let mut log = RequestLog::new(Uuid::new_v4().to_string());
        log.with_request(protocol, &req);

        let target = match self.resolve_target(protocol, &req) {
            Ok(target) => target,
            Err(e) => {
                warn!(
                    request_id = %log.request_id,
                    protocol = protocol.marker(),
                    host = %log.host,
                    error = %e,
                    "라우팅 실패"
                );
                return finish(&mut log, proxy::routing_error_response(&e), Some(&e));
            }
        };

        log.with_target(&target);
        info!(
            request_id = %log.request_id,
            "{} {} -> {}",
            protocol.marker(),
            request_authority(&log.host, protocol),
            target
        );

        if !self.probe.probe(&target).await {
            let e = RoutingError::HostUnreachable {
                target: target.url.clone(),
            };
            warn!(request_id = %log.request_id, target = %target, "헬스 체크 실패");
            return finish(&mut log, proxy::routing_error_response(&e), Some(&e));
        }

        debug!(request_id = %log.request_id, target = %target, "요청 전달");
        match self.forwarder.forward(req, &target).await {
            Ok(response) => finish(&mut log, response, None::<&RoutingError>),
            Err(e) => {
                error!(request_id = %log.request_id, error = %e, "프록시 요청 실패");
                finish(&mut log, proxy::error_response(&e), Some(&e))
            }
        }
    }

    pub async fn handle(
        &self,
        protocol: Protocol,
        req: Request<Incoming>,
    ) -> Result<Response<ProxyBody>, Infallible> {
        let req = req.map(|body| body.boxed_unsync());
        Ok(self.route(protocol, req).await)
    }

    pub async fn handle_connection<I>(&self, protocol: Protocol, io: I) -> Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        http1::Builder::new()
            .serve_connection(io, service_fn(|req| self.handle(protocol, req)))
            .await
    }
}

/// 로그용 요청 authority. 포트가 생략된 Host는 프로토콜 기본 포트를 붙입니다.
fn request_authority(host: &str, protocol: Protocol) -> String {
    match host.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => host.to_string(),
        _ => format!("{}:{}", host, protocol.default_port()),
    }
}

fn finish<E: std::fmt::Display>(
    log: &mut RequestLog,
    response: Response<ProxyBody>,
    error: Option<&E>,
) -> Response<ProxyBody> {
    log.with_response(response.status());
    if let Some(e) = error {
        log.with_error(e);
    }
    log_request(log);
    response
}
