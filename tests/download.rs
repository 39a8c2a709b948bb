//! End-to-end tests against a live server on an ephemeral port

use std::net::SocketAddr;
use std::sync::Arc;

use dlserve::config::{AppState, Config};
use dlserve::server;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<std::io::Result<()>>,
    // Parent of the download root, holds files that must stay unreachable
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("downloads");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("report.pdf"), b"%PDF-1.4 fake report").unwrap();
        std::fs::write(root.join("sub/data.csv"), b"id,name\n1,alpha\n").unwrap();
        std::fs::write(root.join("blob.bin"), (0u8..=255).collect::<Vec<_>>()).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"do not serve").unwrap();

        let mut config = Config::default();
        config.logging.access_log = false;
        config.performance.shutdown_timeout = 1;
        let state = Arc::new(AppState::with_root(config, root));

        let listener = server::create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(server::serve(listener, state, Arc::clone(&shutdown)));

        Self {
            addr,
            shutdown,
            task,
            _dir: dir,
        }
    }

    async fn request(&self, method: &str, uri: &str, headers: &[(&str, &str)]) -> Reply {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
        tokio::spawn(conn);

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", self.addr.to_string());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Empty::<Bytes>::new()).unwrap();

        let resp = sender.send_request(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str) -> Reply {
        self.request("GET", uri, &[]).await
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), self.task)
            .await
            .expect("server did not shut down");
        result.unwrap().unwrap();
    }
}

struct Reply {
    status: StatusCode,
    headers: hyper::HeaderMap,
    body: Bytes,
}

impl Reply {
    fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap())
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn serves_existing_file_as_attachment() {
    let server = TestServer::start().await;

    let reply = server.get("/download/report.pdf").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(&reply.body[..], b"%PDF-1.4 fake report");
    assert_eq!(reply.header("content-type"), "application/pdf");
    assert_eq!(
        reply.header("content-disposition"),
        "attachment; filename=\"report.pdf\""
    );
    assert_eq!(reply.header("content-length"), "20");

    server.stop().await;
}

#[tokio::test]
async fn serves_nested_and_binary_files() {
    let server = TestServer::start().await;

    let reply = server.get("/download/sub/data.csv").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(&reply.body[..], b"id,name\n1,alpha\n");
    assert!(reply.header("content-disposition").contains("data.csv"));

    let reply = server.get("/download/blob.bin").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.to_vec(), (0u8..=255).collect::<Vec<_>>());
    assert_eq!(reply.header("content-type"), "application/octet-stream");

    server.stop().await;
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let server = TestServer::start().await;

    let reply = server.get("/download/missing.txt").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.headers.get("content-disposition").is_none());

    let reply = server.get("/download/sub").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn traversal_never_leaves_download_directory() {
    let server = TestServer::start().await;

    for uri in [
        "/download/../secret.txt",
        "/download/%2e%2e/secret.txt",
        "/download/sub/..%2F..%2Fsecret.txt",
    ] {
        let reply = server.get(uri).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
        assert_ne!(&reply.body[..], b"do not serve", "{uri}");
    }

    server.stop().await;
}

#[tokio::test]
async fn range_and_conditional_requests() {
    let server = TestServer::start().await;

    let reply = server
        .request("GET", "/download/report.pdf", &[("range", "bytes=0-3")])
        .await;
    assert_eq!(reply.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(&reply.body[..], b"%PDF");
    assert_eq!(reply.header("content-range"), "bytes 0-3/20");

    let reply = server
        .request("GET", "/download/report.pdf", &[("range", "bytes=100-")])
        .await;
    assert_eq!(reply.status, StatusCode::RANGE_NOT_SATISFIABLE);

    let etag = server.get("/download/report.pdf").await.header("etag").to_string();
    let reply = server
        .request("GET", "/download/report.pdf", &[("if-none-match", etag.as_str())])
        .await;
    assert_eq!(reply.status, StatusCode::NOT_MODIFIED);
    assert!(reply.body.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn other_methods_and_routes() {
    let server = TestServer::start().await;

    let reply = server.request("HEAD", "/download/report.pdf", &[]).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.header("content-length"), "20");
    assert!(reply.body.is_empty());

    let reply = server.request("POST", "/download/report.pdf", &[]).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);

    let reply = server.get("/report.pdf").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    server.stop().await;
}
