//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use asset_gateway::config::{AssetServerMode, GatewayConfig};
use asset_gateway::{HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the mock provider answers for one request.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<&'static str>,
    /// Close the connection after this many body bytes, despite the declared length.
    pub truncate_at: Option<usize>,
    /// Pause between 1 KiB body writes.
    pub pace: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: None,
            truncate_at: None,
            pace: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok("")
        }
    }
}

/// Start a programmable provider. `f` receives the request path.
pub async fn start_provider<F>(f: F) -> SocketAddr
where
    F: Fn(String) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(path) = read_request_path(&mut socket).await else {
                            return;
                        };
                        let reply = f(path);
                        let status_text = match reply.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let mut head = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status_text,
                            reply.body.len()
                        );
                        if let Some(content_type) = reply.content_type {
                            head.push_str(&format!("Content-Type: {content_type}\r\n"));
                        }
                        head.push_str("\r\n");
                        if socket.write_all(head.as_bytes()).await.is_err() {
                            return;
                        }

                        let sent = reply.truncate_at.unwrap_or(reply.body.len());
                        for piece in reply.body[..sent].chunks(1024) {
                            if socket.write_all(piece).await.is_err() {
                                return;
                            }
                            if !reply.pace.is_zero() {
                                tokio::time::sleep(reply.pace).await;
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.split_whitespace().nth(1).map(str::to_string)
}

/// A running gateway with its own asset and cache directories.
pub struct Gateway {
    pub main_addr: SocketAddr,
    pub asset_addr: SocketAddr,
    pub dir: TempDir,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn asset_url(&self, path: &str) -> String {
        format!("http://{}{}", self.asset_addr, path)
    }

    pub fn main_url(&self, path: &str) -> String {
        format!("http://{}{}", self.main_addr, path)
    }

    pub fn assets(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    pub fn cache(&self) -> PathBuf {
        self.dir.path().join("assets-cache")
    }

    /// Place a file under the primary asset root.
    pub fn put_asset(&self, key: &str, content: &[u8]) {
        let path = self.assets().join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on two ephemeral ports: main and asset.
pub async fn start_gateway(tweak: impl FnOnce(&mut GatewayConfig)) -> Gateway {
    let dir = TempDir::new().unwrap();
    let main = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let asset = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let main_addr = main.local_addr().unwrap();
    let asset_addr = asset.local_addr().unwrap();

    let mut config = GatewayConfig::default();
    config.listener.bind_addresses = vec![main_addr.to_string(), asset_addr.to_string()];
    config.asset_server.mode = AssetServerMode::Full;
    config.asset_server.port = asset_addr.port();
    config.asset_server.asset_root = dir.path().join("assets").to_string_lossy().into_owned();
    config.asset_server.cache_root = dir.path().join("assets-cache").to_string_lossy().into_owned();
    tweak(&mut config);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(vec![main, asset], stop).await;
    });

    Gateway {
        main_addr,
        asset_addr,
        dir,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Every regular file below `root`, sorted. Empty if `root` does not exist.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Poll until `check` holds, for up to two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Deterministic, non-repeating-looking test payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 7) % 256) as u8).collect()
}
