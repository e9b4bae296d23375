//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use spa_edge_proxy::lifecycle::startup::build_server;
use spa_edge_proxy::{EdgeConfig, Shutdown};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl SeenRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut seen = SeenRequest {
        head,
        body: buf[head_end..].to_vec(),
    };

    let content_length: usize = seen
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while seen.body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        seen.body.extend_from_slice(&chunk[..n]);
    }

    Some(seen)
}

/// Start a backend that answers every request with `respond(&request)`,
/// given as `(status line, extra headers, body)`.
pub async fn start_programmable_backend<F>(respond: F) -> SocketAddr
where
    F: Fn(&SeenRequest) -> (&'static str, Vec<(&'static str, String)>, String)
        + Send
        + Sync
        + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = std::sync::Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, headers, body) = respond(&request);

                let mut response = format!("HTTP/1.1 {status}\r\n");
                for (name, value) in headers {
                    response.push_str(&format!("{name}: {value}\r\n"));
                }
                response.push_str(&format!(
                    "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                ));

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Backend that echoes the request head and body back as the response body.
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|request| {
        let body = format!("{}{}", request.head, String::from_utf8_lossy(&request.body));
        ("200 OK", vec![("X-Backend", "linkding".to_string())], body)
    })
    .await
}

/// Backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    addr
}

/// An address with nothing listening on it.
pub fn dead_backend() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Write a small SPA bundle into `root`.
pub fn write_bundle(root: &Path) {
    std::fs::write(root.join("index.html"), "<!doctype html><title>EchoLink</title>").unwrap();
    std::fs::write(root.join("sw.js"), "self.skipWaiting()").unwrap();
    std::fs::write(root.join("app.js"), "import './app-assets/main.js'").unwrap();
    std::fs::create_dir_all(root.join("app-assets")).unwrap();
    std::fs::write(root.join("app-assets/main-9c1e.css"), "body{margin:0}").unwrap();
}

/// A running edge server on an ephemeral port.
pub struct TestEdge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestEdge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestEdge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the edge in front of `backend` and the bundle in `static_root`.
pub async fn start_edge(backend: SocketAddr, static_root: &Path) -> TestEdge {
    start_edge_with(backend, static_root, |_| {}).await
}

pub async fn start_edge_with<F>(backend: SocketAddr, static_root: &Path, tweak: F) -> TestEdge
where
    F: FnOnce(&mut EdgeConfig),
{
    let mut config = EdgeConfig::default();
    config.backend.url = format!("http://{backend}");
    config.static_files.root = static_root.to_string_lossy().into_owned();
    tweak(&mut config);

    let server = build_server(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestEdge { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Send raw bytes and return the whole response as text. Used for request
/// targets that an HTTP client library would normalize away.
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}
