//! Fixtures shared by unit tests: a local HTTP server and archive builders.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

type Routes = Arc<HashMap<String, (u16, Vec<u8>)>>;

/// Minimal HTTP/1.1 server on 127.0.0.1 that serves fixed responses.
///
/// Runs on its own thread and runtime so it outlives any runtime the test
/// itself creates.
pub struct TestServer {
    base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    pub fn start(routes: Vec<(&str, u16, Vec<u8>)>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Should bind");
        listener.set_nonblocking(true).expect("Should set nonblocking");
        let addr = listener.local_addr().expect("Should have address");

        let routes: Routes = Arc::new(
            routes
                .into_iter()
                .map(|(path, status, body)| (path.to_string(), (status, body)))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(HashMap::new()));
        let server_hits = Arc::clone(&hits);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Should build runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("Should adopt listener");
                loop {
                    let Ok((socket, _)) = listener.accept().await else {
                        continue;
                    };
                    tokio::spawn(serve(socket, Arc::clone(&routes), Arc::clone(&server_hits)));
                }
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            hits,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn serve(
    mut socket: tokio::net::TcpStream,
    routes: Routes,
    hits: Arc<Mutex<HashMap<String, usize>>>,
) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    *hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, b"not found".to_vec()));
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = socket.write_all(header.as_bytes()).await;
    let _ = socket.write_all(&body).await;
    let _ = socket.shutdown().await;
}

/// Entry of a test tarball.
pub enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8], u32),
    Symlink(&'a str, &'a str),
}

/// Builds a gzip tarball in memory.
pub fn tar_gz(entries: &[Entry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match *entry {
            Entry::Dir(path) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .expect("Should append dir");
            }
            Entry::File(path, content, mode) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(mode);
                header.set_size(content.len() as u64);
                builder
                    .append_data(&mut header, path, content)
                    .expect("Should append file");
            }
            Entry::Symlink(path, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_mode(0o777);
                header.set_size(0);
                builder
                    .append_link(&mut header, path, target)
                    .expect("Should append symlink");
            }
        }
    }
    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

/// Tarball laid out like an official Go release.
pub fn go_archive(version: &str) -> Vec<u8> {
    let marker = format!("{version}\n");
    tar_gz(&[
        Entry::Dir("go/"),
        Entry::Dir("go/bin/"),
        Entry::File("go/bin/go", b"#!/bin/sh\necho go\n", 0o755),
        Entry::File("go/bin/gofmt", b"#!/bin/sh\necho gofmt\n", 0o755),
        Entry::File("go/VERSION", marker.as_bytes(), 0o644),
        Entry::Symlink("go/bin/go-alias", "go"),
    ])
}

/// Tarball laid out like a golangci-lint release.
pub fn lint_archive(version: &str, os: &str, arch: &str) -> Vec<u8> {
    let root = format!("golangci-lint-{}-{os}-{arch}", version.trim_start_matches('v'));
    let binary = format!("{root}/golangci-lint");
    let readme = format!("{root}/README.md");
    tar_gz(&[
        Entry::File(&readme, b"readme", 0o644),
        Entry::File(&binary, b"#!/bin/sh\necho lint\n", 0o755),
    ])
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(bytes))
}

/// Writes `bytes` to `path`, creating parent directories.
pub fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Should create parent");
    }
    std::fs::write(path, bytes).expect("Should write file");
}
