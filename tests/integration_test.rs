//! Tests de integración para el servidor de archivos estáticos
//! tests/integration_test.rs
//!
//! Cada test levanta un `Server` completo en un puerto efímero, con un
//! directorio de contenido temporal, y le habla por TCP.

use static_server::config::Config;
use static_server::server::{Server, SessionLimits};
use static_server::shutdown::Shutdown;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Servidor corriendo en background; se detiene al hacer drop
struct TestServer {
    addr: SocketAddr,
    server: Arc<Server>,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
    content: TempDir,
}

impl TestServer {
    fn start(show_extension: bool) -> Self {
        Self::start_with_limits(show_extension, SessionLimits::default())
    }

    fn start_with_limits(show_extension: bool, limits: SessionLimits) -> Self {
        let content = TempDir::new().unwrap();
        populate(content.path());

        let config = Config {
            port: 0,
            content_dir: content.path().to_path_buf(),
            show_file_extension: show_extension,
            thread_pool_size: 4,
            ..Config::default()
        };

        let server = Arc::new(Server::with_limits(config, limits).unwrap());
        let listener = server.bind().unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let handle = {
            let server = Arc::clone(&server);
            let shutdown = shutdown.clone();
            thread::spawn(move || server.run(listener, &shutdown).unwrap())
        };

        Self {
            addr,
            server,
            shutdown,
            handle: Some(handle),
            content,
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream
    }

    /// Envía un request y lee hasta que el servidor cierra
    fn request(&self, raw: &str) -> (String, Vec<u8>) {
        let mut stream = self.connect();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut all = Vec::new();
        stream.read_to_end(&mut all).unwrap();
        split(&all)
    }

    fn content_path(&self, name: &str) -> std::path::PathBuf {
        self.content.path().join(name)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn populate(root: &Path) {
    fs::write(root.join("index.html"), "hello\n").unwrap();
    fs::write(root.join("about.html"), "<h1>about</h1>").unwrap();
    fs::write(root.join("digits.txt"), "0123456789").unwrap();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/index.html"), "docs index").unwrap();
    fs::write(root.join("docs.html"), "old docs").unwrap();
}

fn split(raw: &[u8]) -> (String, Vec<u8>) {
    match raw.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => (
            String::from_utf8_lossy(&raw[..pos + 4]).into_owned(),
            raw[pos + 4..].to_vec(),
        ),
        None => (String::from_utf8_lossy(raw).into_owned(), Vec::new()),
    }
}

/// Lee una respuesta en una conexión que sigue abierta
fn read_response(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        assert_eq!(stream.read(&mut byte).unwrap(), 1, "connection closed early");
        head.push(byte[0]);
    }
    let head = String::from_utf8(head).unwrap();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).unwrap();
    (head, body)
}

fn http_date(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

// ==================== Modos de URL ====================

#[test]
fn test_hidden_mode_root_serves_index() {
    let server = TestServer::start(false);
    let (head, body) = server.request("GET / HTTP/1.1\r\n\r\n");

    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", head);
    assert!(head.contains("Content-Type: text/html"));
    assert_eq!(body, b"hello\n");
}

#[test]
fn test_hidden_mode_clean_urls() {
    let server = TestServer::start(false);

    let (head, body) = server.request("GET /about HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(body, b"<h1>about</h1>");

    let (head, _) = server.request("GET /docs.html HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
    assert!(head.contains("Location: /docs/\r\n"));
}

#[test]
fn test_visible_mode_appends_html() {
    let server = TestServer::start(true);
    let (head, body) = server.request("GET /about HTTP/1.1\r\n\r\n");

    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", head);
    assert_eq!(body, b"<h1>about</h1>");
}

#[test]
fn test_visible_mode_redirects() {
    let server = TestServer::start(true);

    let (head, _) = server.request("GET / HTTP/1.1\r\n\r\n");
    assert!(head.contains("Location: /index.html\r\n"));

    let (head, _) = server.request("GET /docs HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
    assert!(head.contains("Location: /docs/\r\n"));

    let (_, body) = server.request("GET /docs/ HTTP/1.1\r\n\r\n");
    assert_eq!(body, b"docs index");
}

// ==================== Seguridad ====================

#[test]
fn test_traversal_forbidden() {
    let server = TestServer::start(false);
    for path in ["/../etc/passwd", "/docs/../../secret", "/%2e%2e/..%2fx"] {
        let (head, _) = server.request(&format!("GET {} HTTP/1.1\r\n\r\n", path));
        assert!(head.starts_with("HTTP/1.1 403 Forbidden\r\n"), "{} -> {}", path, head);
    }
}

#[test]
fn test_missing_file_visible_mode_not_found() {
    let server = TestServer::start(true);
    let (head, _) = server.request("GET /nothing-here HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[test]
fn test_missing_file_hidden_mode_forbidden() {
    let server = TestServer::start(false);
    let (head, _) = server.request("GET /nothing-here HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 403 Forbidden\r\n"));
}

// ==================== Rangos y condicionales ====================

#[test]
fn test_range_request() {
    let server = TestServer::start(false);
    let (head, body) = server.request("GET /digits.txt HTTP/1.1\r\nRange: bytes=2-4\r\n\r\n");

    assert!(head.starts_with("HTTP/1.1 206 Partial Content\r\n"));
    assert!(head.contains("Content-Range: bytes 2-4/10\r\n"));
    assert_eq!(body, b"234");
}

#[test]
fn test_conditional_get() {
    let server = TestServer::start(false);
    let mtime = fs::metadata(server.content_path("digits.txt"))
        .unwrap()
        .modified()
        .unwrap();

    let (head, body) = server.request(&format!(
        "GET /digits.txt HTTP/1.1\r\nIf-Modified-Since: {}\r\n\r\n",
        http_date(mtime)
    ));
    assert!(head.starts_with("HTTP/1.1 304 Not Modified\r\n"));
    assert!(body.is_empty());

    let (head, body) = server.request(&format!(
        "GET /digits.txt HTTP/1.1\r\nIf-Modified-Since: {}\r\n\r\n",
        http_date(mtime - Duration::from_secs(3600))
    ));
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(body, b"0123456789");
}

#[test]
fn test_unparseable_date_ignored() {
    let server = TestServer::start(false);
    let (head, _) = server.request("GET /digits.txt HTTP/1.1\r\nIf-Modified-Since: yesterday\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
}

// ==================== Keep-alive ====================

#[test]
fn test_keep_alive_two_requests() {
    let server = TestServer::start(false);
    let mut stream = server.connect();

    stream
        .write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .unwrap();
    let (head, body) = read_response(&mut stream);
    assert!(head.contains("Connection: keep-alive\r\n"));
    assert_eq!(body, b"hello\n");

    stream
        .write_all(b"GET /digits.txt HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .unwrap();
    let (_, body) = read_response(&mut stream);
    assert_eq!(body, b"0123456789");
}

#[test]
fn test_connection_closes_after_max_age() {
    let limits = SessionLimits {
        max_age: Duration::from_millis(300),
        ..SessionLimits::default()
    };
    let server = TestServer::start_with_limits(false, limits);
    let mut stream = server.connect();

    for _ in 0..2 {
        stream
            .write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
            .unwrap();
        read_response(&mut stream);
    }

    thread::sleep(Duration::from_millis(500));
    let _ = stream.write_all(b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n");

    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest);
    assert!(rest.is_empty());
}

// ==================== Endpoints y métodos ====================

#[test]
fn test_health_endpoint() {
    let server = TestServer::start(false);
    server.request("GET / HTTP/1.1\r\n\r\n");

    let (head, body) = server.request("GET /health HTTP/1.1\r\n\r\n");
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["requests"].as_u64().unwrap() >= 1);
    assert!(json["bytes_served"].as_u64().unwrap() > 0);
    for key in ["uptime", "avg_response_time_ms", "peak_memory_kb", "cpu_time_ms"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
}

#[test]
fn test_method_not_allowed() {
    let server = TestServer::start(false);
    let (head, _) = server.request("DELETE /index.html HTTP/1.1\r\n\r\n");

    assert!(head.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(head.contains("Allow: GET, HEAD\r\n"));
}

#[test]
fn test_head_request() {
    let server = TestServer::start(false);
    let (head, body) = server.request("HEAD /digits.txt HTTP/1.1\r\n\r\n");

    assert!(head.contains("Content-Length: 10\r\n"));
    assert!(body.is_empty());
}

#[test]
fn test_concurrent_clients() {
    let server = Arc::new(TestServer::start(false));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || server.request("GET /about HTTP/1.1\r\n\r\n"))
        })
        .collect();

    for handle in handles {
        let (head, body) = handle.join().unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(body, b"<h1>about</h1>");
    }
    assert_eq!(server.server.metrics().get_snapshot().total_requests, 16);
}
