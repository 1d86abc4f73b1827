use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::{header, Method, Request, StatusCode};
use tokio::time::timeout;
use tracing::debug;

use crate::routing::ResolvedTarget;
use super::{BackendConnector, BackendError};

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// 대상이 HTTP 응답을 돌려주면 `true`
    async fn probe(&self, target: &ResolvedTarget) -> bool;
}

/// `GET /` 한 번으로 백엔드 생존 여부를 확인합니다.
///
/// 상태 코드와 무관하게 응답 헤더를 받으면 살아있는 것으로 봅니다.
/// 재시도는 하지 않으며 전체 시도가 `timeout` 안에 끝나야 합니다.
pub struct HttpProbe {
    connector: BackendConnector,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(connector: BackendConnector, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    pub async fn check(&self, target: &ResolvedTarget) -> Result<StatusCode, BackendError> {
        let mut sender = self.connector.connect::<Empty<Bytes>>(target).await?;

        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header(header::HOST, target.authority())
            .body(Empty::<Bytes>::new())
            .map_err(|e| BackendError::InvalidRequest {
                target: target.url.clone(),
                reason: e.to_string(),
            })?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| BackendError::Request {
                target: target.url.clone(),
                source: e,
            })?;

        Ok(response.status())
    }

    /// 타임아웃을 포함한 한 번의 헬스 체크
    pub async fn check_with_timeout(&self, target: &ResolvedTarget) -> Result<StatusCode, BackendError> {
        match timeout(self.timeout, self.check(target)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                target: target.url.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, target: &ResolvedTarget) -> bool {
        match self.check_with_timeout(target).await {
            Ok(status) => {
                debug!(target = %target.url, status = %status, "헬스 체크 성공");
                true
            }
            Err(e) => {
                debug!(target = %target.url, error = %e, "헬스 체크 실패");
                false
            }
        }
    }
}
