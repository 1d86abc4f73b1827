use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use local_dev_proxy::{
    backend::{BackendConnector, BackendError, HttpProbe, LivenessProbe},
    routing::{HostEntry, HostTable, Protocol, ResolvedTarget},
    server::{ServerListener, ServerManager},
    settings::{BackendSettings, Settings},
    tls::TlsConfig,
};
use rcgen::{generate_simple_self_signed, CertifiedKey};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

// 메서드, 경로, Host 헤더를 본문으로 돌려주는 백엔드
async fn echo(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = format!("{} {} {}", req.method(), req.uri(), host);
    Ok(Response::builder()
        .status(201)
        .body(Full::new(Bytes::from(body)))
        .unwrap())
}

async fn spawn_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(echo))
                    .await;
            });
        }
    });

    addr
}

// TLS 종료 후 echo 응답을 돌려주는 백엔드
async fn spawn_tls_backend(acceptor: TlsAcceptor) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(tls_stream) = acceptor.accept(stream).await {
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(tls_stream), service_fn(echo))
                        .await;
                }
            });
        }
    });

    addr
}

// 연결은 받지만 응답하지 않는 백엔드
async fn spawn_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    addr
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

// 자체 서명 인증서와 PKCS#8 개인키를 임시 디렉토리에 기록
fn self_signed_cert(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let CertifiedKey { cert, signing_key } =
        generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, signing_key.serialize_pem()).unwrap();
    (cert_path, key_path)
}

fn backend_settings() -> BackendSettings {
    BackendSettings {
        target_domain: "127.0.0.1".to_string(),
        probe_timeout_ms: 1000,
        ..Default::default()
    }
}

fn target(protocol: Protocol, port: u16) -> ResolvedTarget {
    ResolvedTarget {
        protocol,
        subdomains: Vec::new(),
        apex_host: "app.test".to_string(),
        host: "127.0.0.1".to_string(),
        port,
        url: format!("{}://127.0.0.1:{}", protocol.scheme(), port),
    }
}

fn probe_with_timeout(timeout: Duration) -> HttpProbe {
    let connector = BackendConnector::new(&backend_settings()).unwrap();
    HttpProbe::new(connector, timeout)
}

fn probe() -> HttpProbe {
    probe_with_timeout(Duration::from_secs(1))
}

struct RunningProxy {
    http_addr: SocketAddr,
    https_addr: Option<SocketAddr>,
    shutdown: oneshot::Sender<()>,
}

// 프록시를 띄우고 주소와 종료 채널을 반환
async fn spawn_proxy(table: HostTable, https: Option<TlsConfig>) -> RunningProxy {
    let settings = Settings {
        backend: backend_settings(),
        ..Default::default()
    };
    let router = Arc::new(ServerManager::build_router(&settings, Arc::new(table)).unwrap());

    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = ServerListener::from_parts(http_listener, https);
    let http_addr = listener.http_addr().unwrap();
    let https_addr = listener.https_addr().unwrap();

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        listener
            .run(router, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    RunningProxy {
        http_addr,
        https_addr,
        shutdown: tx,
    }
}

async fn raw_request(addr: SocketAddr, host: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        host
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}

#[tokio::test]
async fn test_probe_reachable_backend() {
    let backend = spawn_backend().await;
    assert!(probe().probe(&target(Protocol::Http, backend.port())).await);
}

#[tokio::test]
async fn test_probe_closed_port() {
    let port = closed_port().await;
    assert!(!probe().probe(&target(Protocol::Http, port)).await);
}

#[tokio::test]
async fn test_silent_backend_times_out() {
    let backend = spawn_silent_backend().await;
    let timeout = Duration::from_millis(300);
    let probe = probe_with_timeout(timeout);
    let target = target(Protocol::Http, backend.port());

    assert!(matches!(
        probe.check_with_timeout(&target).await,
        Err(BackendError::Timeout { .. })
    ));

    let started = Instant::now();
    assert!(!probe.probe(&target).await);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_probe_https_backend_with_self_signed_cert() {
    let dir = tempfile::tempdir().unwrap();
    let (cert_path, key_path) = self_signed_cert(&dir);
    let acceptor = TlsConfig::load_acceptor(&cert_path, &key_path).unwrap();
    let backend = spawn_tls_backend(acceptor).await;

    let probe = probe();
    let target = target(Protocol::Https, backend.port());
    assert_eq!(probe.check_with_timeout(&target).await.unwrap(), StatusCode::CREATED);
    assert!(probe.probe(&target).await);
}

#[tokio::test]
async fn test_proxy_round_trip() {
    let backend = spawn_backend().await;
    let proxy = spawn_proxy(
        HostTable::from_entries(vec![
            ("app.test", HostEntry::ports(Some(backend.port()), None)),
            ("alias.test", HostEntry::alias("app.test")),
        ]),
        None,
    )
    .await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client
        .post(format!("http://{}/items?page=2", proxy.http_addr))
        .header(reqwest::header::HOST, "alias.test")
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(response.text().await.unwrap(), "POST /items?page=2 alias.test");

    let _ = proxy.shutdown.send(());
}

#[tokio::test]
async fn test_https_listener_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (cert_path, key_path) = self_signed_cert(&dir);
    let backend = spawn_tls_backend(TlsConfig::load_acceptor(&cert_path, &key_path).unwrap()).await;

    let https = TlsConfig {
        acceptor: TlsConfig::load_acceptor(&cert_path, &key_path).unwrap(),
        listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
    };
    let proxy = spawn_proxy(
        HostTable::from_entries(vec![("app.test", HostEntry::ports(None, Some(backend.port())))]),
        Some(https),
    )
    .await;
    let https_addr = proxy.https_addr.unwrap();

    // 클라이언트도 인증서 검증 없이 TLS로 프록시에 연결
    let connector = BackendConnector::new(&BackendSettings::default()).unwrap();
    let mut sender = connector
        .connect::<Empty<Bytes>>(&target(Protocol::Https, https_addr.port()))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/secure?x=1")
        .header(header::HOST, "app.test")
        .body(Empty::<Bytes>::new())
        .unwrap();
    let response = sender.send_request(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"GET /secure?x=1 app.test");

    // HTTPS 포트만 있는 호스트는 HTTP 리스너에서 Unknown host
    let response = raw_request(proxy.http_addr, "app.test").await;
    assert!(response.starts_with("HTTP/1.1 404 Unknown host\r\n"), "{}", response);

    let _ = proxy.shutdown.send(());
}

#[tokio::test]
async fn test_proxy_status_lines() {
    let proxy = spawn_proxy(
        HostTable::from_entries(vec![
            ("down.test", HostEntry::ports(Some(closed_port().await), None)),
            ("secure.test", HostEntry::ports(None, Some(4443))),
        ]),
        None,
    )
    .await;

    let response = raw_request(proxy.http_addr, "nowhere.test").await;
    assert!(response.starts_with("HTTP/1.1 404 Unknown host\r\n"), "{}", response);

    let response = raw_request(proxy.http_addr, "secure.test").await;
    assert!(response.starts_with("HTTP/1.1 404 Unknown host\r\n"), "{}", response);

    let response = raw_request(proxy.http_addr, "down.test").await;
    assert!(response.starts_with("HTTP/1.1 404 Host unreachable\r\n"), "{}", response);

    let _ = proxy.shutdown.send(());
}
