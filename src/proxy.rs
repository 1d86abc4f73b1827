use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full};
use hyper::ext::ReasonPhrase;
use hyper::{header, Request, Response, StatusCode, Uri};
use tracing::{debug, instrument};

use crate::backend::{BackendConnector, BackendError};
use crate::routing::{ResolvedTarget, RoutingError};

/// 프록시가 주고받는 요청/응답 본문 타입
pub type ProxyBody = UnsyncBoxBody<Bytes, hyper::Error>;

pub fn empty_body() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn full_body(data: impl Into<Bytes>) -> ProxyBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// 확인된 대상으로 요청을 전달하고 응답을 돌려줍니다.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        req: Request<ProxyBody>,
        target: &ResolvedTarget,
    ) -> Result<Response<ProxyBody>, BackendError>;
}

/// 요청/응답 본문을 스트리밍으로 전달하는 기본 포워더
///
/// 요청 URI를 origin-form으로 바꾸는 것 외에는 메서드, 헤더(원래 Host 포함),
/// 본문을 그대로 보냅니다.
#[derive(Clone)]
pub struct HttpForwarder {
    connector: BackendConnector,
}

impl HttpForwarder {
    pub fn new(connector: BackendConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    #[instrument(skip(self, req, target), fields(target = %target.url))]
    async fn forward(
        &self,
        req: Request<ProxyBody>,
        target: &ResolvedTarget,
    ) -> Result<Response<ProxyBody>, BackendError> {
        let proxied_req = build_proxied_request(req, target)?;
        let mut sender = self.connector.connect::<ProxyBody>(target).await?;

        let response = sender
            .send_request(proxied_req)
            .await
            .map_err(|e| BackendError::Request {
                target: target.url.clone(),
                source: e,
            })?;

        debug!(status = %response.status(), "백엔드 응답 수신");
        Ok(response.map(|body| body.boxed_unsync()))
    }
}

pub fn build_proxied_request(
    req: Request<ProxyBody>,
    target: &ResolvedTarget,
) -> Result<Request<ProxyBody>, BackendError> {
    let (mut parts, body) = req.into_parts();

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    parts.uri = path.parse::<Uri>().map_err(|e| BackendError::InvalidRequest {
        target: target.url.clone(),
        reason: e.to_string(),
    })?;

    if !parts.headers.contains_key(header::HOST) {
        let host = target
            .authority()
            .parse()
            .map_err(|e: header::InvalidHeaderValue| BackendError::InvalidRequest {
                target: target.url.clone(),
                reason: e.to_string(),
            })?;
        parts.headers.insert(header::HOST, host);
    }

    Ok(Request::from_parts(parts, body))
}

/// 본문 없는 404 응답. 상태 줄에 라우팅 에러 사유를 싣습니다.
pub fn routing_error_response(error: &RoutingError) -> Response<ProxyBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(error.reason_phrase().as_bytes()));
    response
}

/// 전달 실패 시 502 응답
pub fn error_response(error: &BackendError) -> Response<ProxyBody> {
    let mut response = Response::new(full_body(format!("Backend error: {}", error)));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
