use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use hyper::{header, Request, Response, StatusCode};
use local_dev_proxy::{
    backend::{BackendError, LivenessProbe},
    proxy::{empty_body, full_body, Forwarder, ProxyBody},
    routing::{HostEntry, HostResolver, HostTable, Protocol, ResolvedTarget, TargetComposer, FALLBACK_KEY},
    server::RequestRouter,
};
use std::sync::{Arc, Mutex};

// 대상 URL을 기록하고 미리 정한 결과를 돌려주는 헬스 체크
struct MockProbe {
    reachable: bool,
    calls: Mutex<Vec<String>>,
}

impl MockProbe {
    fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessProbe for MockProbe {
    async fn probe(&self, target: &ResolvedTarget) -> bool {
        self.calls.lock().unwrap().push(target.url.clone());
        self.reachable
    }
}

// 전달된 요청의 대상과 Host 헤더를 기록
#[derive(Default)]
struct RecordingForwarder {
    forwarded: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingForwarder {
    fn forwarded(&self) -> Vec<(String, String)> {
        self.forwarded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(
        &self,
        req: Request<ProxyBody>,
        target: &ResolvedTarget,
    ) -> Result<Response<ProxyBody>, BackendError> {
        if self.fail {
            return Err(BackendError::Timeout {
                target: target.url.clone(),
                timeout: std::time::Duration::from_millis(1),
            });
        }

        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.forwarded.lock().unwrap().push((target.url.clone(), host));
        Ok(Response::new(full_body("ok")))
    }
}

fn table() -> Arc<HostTable> {
    Arc::new(HostTable::from_entries(vec![
        ("a.test", HostEntry::ports(Some(801), None)),
        ("b.test", HostEntry::alias("a.test")),
        (FALLBACK_KEY, HostEntry::alias("a.test")),
    ]))
}

fn router(probe: Arc<MockProbe>, forwarder: Arc<RecordingForwarder>) -> RequestRouter {
    RequestRouter::new(
        HostResolver::new(table()),
        TargetComposer::default(),
        probe,
        forwarder,
    )
}

fn request(host: &str) -> Request<ProxyBody> {
    Request::builder()
        .uri("/")
        .header(header::HOST, host)
        .body(empty_body())
        .unwrap()
}

fn reason(response: &Response<ProxyBody>) -> Option<&[u8]> {
    response.extensions().get::<ReasonPhrase>().map(|r| r.as_bytes())
}

#[tokio::test]
async fn test_alias_forwarded_with_subdomain() {
    let probe = MockProbe::new(true);
    let forwarder = Arc::new(RecordingForwarder::default());
    let router = router(probe.clone(), forwarder.clone());

    let response = router.route(Protocol::Http, request("x.b.test")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(probe.calls(), vec!["http://x.local.dev:801"]);
    assert_eq!(
        forwarder.forwarded(),
        vec![("http://x.local.dev:801".to_string(), "x.b.test".to_string())]
    );
}

#[tokio::test]
async fn test_absent_host_uses_fallback() {
    let probe = MockProbe::new(true);
    let forwarder = Arc::new(RecordingForwarder::default());
    let router = router(probe.clone(), forwarder.clone());

    let response = router.route(Protocol::Http, request("y.c.test")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(forwarder.forwarded()[0].0, "http://y.local.dev:801");
}

#[tokio::test]
async fn test_unreachable_backend_returns_404() {
    let probe = MockProbe::new(false);
    let forwarder = Arc::new(RecordingForwarder::default());
    let router = router(probe.clone(), forwarder.clone());

    let response = router.route(Protocol::Http, request("y.c.test")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), Some(&b"Host unreachable"[..]));
    assert_eq!(probe.calls(), vec!["http://y.local.dev:801"]);
    assert!(forwarder.forwarded().is_empty());
}

#[tokio::test]
async fn test_missing_https_port_skips_probe() {
    let probe = MockProbe::new(true);
    let forwarder = Arc::new(RecordingForwarder::default());
    let router = router(probe.clone(), forwarder.clone());

    let response = router.route(Protocol::Https, request("x.b.test")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), Some(&b"Unknown host"[..]));
    assert!(probe.calls().is_empty());
    assert!(forwarder.forwarded().is_empty());
}

#[tokio::test]
async fn test_missing_or_invalid_host_is_unknown() {
    let probe = MockProbe::new(true);
    let forwarder = Arc::new(RecordingForwarder::default());
    let router = router(probe.clone(), forwarder.clone());

    let no_host = Request::builder().uri("/").body(empty_body()).unwrap();
    let response = router.route(Protocol::Http, no_host).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), Some(&b"Unknown host"[..]));

    let response = router.route(Protocol::Http, request("localhost")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), Some(&b"Unknown host"[..]));

    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn test_forward_failure_returns_bad_gateway() {
    let probe = MockProbe::new(true);
    let forwarder = Arc::new(RecordingForwarder {
        fail: true,
        ..Default::default()
    });
    let router = router(probe.clone(), forwarder);

    let response = router.route(Protocol::Http, request("a.test")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(probe.calls(), vec!["http://local.dev:801"]);
}

#[test]
fn test_resolve_target_without_network() {
    let router = router(MockProbe::new(true), Arc::new(RecordingForwarder::default()));
    let target = router
        .resolve_target(Protocol::Http, &request("API.B.test:8080"))
        .unwrap();

    assert_eq!(target.url, "http://api.local.dev:801");
    assert_eq!(target.apex_host, "b.test");
    assert_eq!(target.subdomains, vec!["api"]);
}
