//! # Sesión de Conexión
//! src/server/session.rs
//!
//! Atiende una conexión aceptada de principio a fin. Con keep-alive la
//! conexión se reutiliza mientras:
//! - llegue otro request antes del timeout de lectura (5 s),
//! - la conexión tenga menos de 30 s de vida,
//! - no se hayan atendido 100 requests.
//!
//! Cada request pasa por parse → whitelist → health → método → resolución
//! → envío, y deja una línea en el access log y una muestra en las métricas.

use crate::access_log::{AccessLog, AccessRecord};
use crate::cache::FileCache;
use crate::http::request::MAX_REQUEST_SIZE;
use crate::http::{ParsedRequest, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::resolver::{PathResolver, Resolution};
use crate::server::files::{self, ServeError};
use crate::whitelist::Whitelist;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Espera máxima por el siguiente request
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Vida máxima de una conexión keep-alive
pub const MAX_CONNECTION_AGE: Duration = Duration::from_secs(30);

/// Requests máximos por conexión
pub const MAX_REQUESTS_PER_CONNECTION: usize = 100;

/// Protocolo registrado en el access log
const LOG_PROTOCOL: &str = "HTTP/1.1";

/// Conexión aceptada esperando un worker
#[derive(Debug)]
pub struct WorkItem {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    /// Directorio de contenido ya canonicalizado
    pub content_root: Arc<Path>,
    pub show_extension: bool,
}

/// Límites del loop keep-alive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub read_timeout: Duration,
    pub max_age: Duration,
    pub max_requests: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            read_timeout: READ_TIMEOUT,
            max_age: MAX_CONNECTION_AGE,
            max_requests: MAX_REQUESTS_PER_CONNECTION,
        }
    }
}

/// Estado compartido por todos los workers
pub struct ServerContext {
    pub cache: FileCache,
    pub metrics: MetricsCollector,
    pub access_log: AccessLog,
    pub whitelist: Whitelist,
    pub limits: SessionLimits,
}

impl ServerContext {
    pub fn new(whitelist: Whitelist, access_log: AccessLog) -> Self {
        Self {
            cache: FileCache::new(),
            metrics: MetricsCollector::new(),
            access_log,
            whitelist,
            limits: SessionLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Cuenta los bytes que realmente llegaron al socket
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    written: u64,
}

impl<'a, W: Write> CountingWriter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Atiende una conexión hasta cerrarla
pub fn handle_connection(item: WorkItem, ctx: &ServerContext) {
    let WorkItem {
        mut stream,
        peer,
        content_root,
        show_extension,
    } = item;

    log::debug!("Accepted connection from {}", peer);

    if !ctx.whitelist.ip_allowed(peer.ip()) {
        log::info!("Connection from {} blocked by whitelist", peer.ip());
        let _ = Response::error(StatusCode::Forbidden).write_to(&mut stream, true);
        return;
    }

    if let Err(e) = stream.set_read_timeout(Some(ctx.limits.read_timeout)) {
        log::warn!("could not set read timeout for {}: {}", peer, e);
        return;
    }

    let resolver = PathResolver::from_canonical(content_root, show_extension);
    let started = Instant::now();
    let mut served = 0;
    let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

    loop {
        // AWAIT_REQUEST: ver si hay datos sin consumirlos
        match stream.peek(&mut buffer[..1]) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        if served > 0 && started.elapsed() > ctx.limits.max_age {
            break;
        }

        let read = match stream.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        // PROCESS
        let keep_going = process_request(&mut stream, &buffer[..read], peer, &resolver, ctx);
        served += 1;

        if !keep_going
            || served >= ctx.limits.max_requests
            || started.elapsed() > ctx.limits.max_age
        {
            break;
        }
    }

    if served > 1 {
        log::debug!("Connection from {} served {} requests", peer, served);
    }
    // CLOSE: el stream se cierra al salir de scope
}

/// Procesa un request. Retorna `true` si la conexión puede seguir abierta.
fn process_request<S: Write>(
    stream: &mut S,
    raw: &[u8],
    peer: SocketAddr,
    resolver: &PathResolver,
    ctx: &ServerContext,
) -> bool {
    let start = Instant::now();
    let mut out = CountingWriter::new(stream);

    let request = match ParsedRequest::parse(raw) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("Malformed request from {}: {}", peer, e);
            let _ = Response::error(StatusCode::BadRequest).write_to(&mut out, true);
            record(ctx, peer, None, StatusCode::BadRequest, out.written, start);
            return false;
        }
    };

    match respond(&mut out, &request, resolver, ctx) {
        Ok(status) => {
            record(ctx, peer, Some(&request), status, out.written, start);
            request.keep_alive()
        }
        Err(e) => {
            log::debug!(
                "{} {} aborted for {}: {}",
                request.method_token(),
                request.raw_path(),
                peer,
                e
            );
            record(ctx, peer, Some(&request), e.status(), out.written, start);
            false
        }
    }
}

/// Elige y envía la respuesta. Un `Err` significa que la escritura falló.
fn respond<W: Write>(
    out: &mut W,
    request: &ParsedRequest,
    resolver: &PathResolver,
    ctx: &ServerContext,
) -> Result<StatusCode, ServeError> {
    let keep_alive = request.keep_alive();
    let include_body = !request.is_head();
    let path = request.raw_path();
    let route = path.split_once('?').map_or(path, |(route, _)| route);

    let send = |out: &mut W, response: Response| -> Result<StatusCode, ServeError> {
        let response = response.with_keep_alive(keep_alive);
        response
            .write_to(out, include_body)
            .map_err(files::aborted(response.status()))?;
        Ok(response.status())
    };

    if !ctx.whitelist.file_allowed(path) {
        log::info!("Request for {} blocked by file whitelist", path);
        return send(out, Response::error(StatusCode::Forbidden));
    }

    if route == "/health" || route == "/status" {
        return send(out, Response::json(&ctx.metrics.health_json()));
    }

    if request.method().is_err() {
        return send(out, Response::method_not_allowed());
    }

    match resolver.resolve(path) {
        Resolution::Redirect(location) => send(out, Response::redirect(&location)),
        Resolution::Reject(status) => {
            if status == StatusCode::Forbidden {
                log::info!("Rejected {} with 403", path);
            }
            send(out, Response::error(status))
        }
        Resolution::Serve(target) => match files::serve_file(out, &target, request, &ctx.cache) {
            Ok(status) => Ok(status),
            Err(ServeError::NotFound) => send(out, Response::error(StatusCode::NotFound)),
            Err(e) => Err(e),
        },
    }
}

/// Access log + métricas para un request respondido
fn record(
    ctx: &ServerContext,
    peer: SocketAddr,
    request: Option<&ParsedRequest>,
    status: StatusCode,
    bytes: u64,
    start: Instant,
) {
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    ctx.metrics.record_request(bytes, elapsed_ms);

    let (method, path) = request
        .map(|r| (r.method_token(), r.raw_path()))
        .unwrap_or(("-", "-"));

    log::debug!("{} {} -> {} ({:.3} ms)", method, path, status.as_u16(), elapsed_ms);

    ctx.access_log.record(&AccessRecord {
        client_ip: peer.ip(),
        method,
        path,
        protocol: LOG_PROTOCOL,
        status: status.as_u16(),
        bytes,
        referer: request.and_then(|r| r.referer()),
        user_agent: request.and_then(|r| r.user_agent()),
    });
}
