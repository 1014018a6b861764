//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Listener + pool de workers. El thread del listener acepta conexiones y
//! las encola; los workers atienden cada una con `handle_connection`.
//!
//! El `accept` no es bloqueante: entre intentos se revisa el token de
//! apagado, así que una señal detiene el loop en a lo sumo
//! `ACCEPT_POLL_INTERVAL`.

use crate::access_log::AccessLog;
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::metrics::MetricsCollector;
use crate::server::session::{handle_connection, ServerContext, SessionLimits, WorkItem};
use crate::shutdown::Shutdown;
use crate::whitelist::Whitelist;
use crate::workers::{WorkerPool, QUEUE_CAPACITY};
use std::io::ErrorKind;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pausa entre intentos de `accept` sin conexiones pendientes
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Servidor de archivos estáticos
pub struct Server {
    config: Config,
    content_root: Arc<Path>,
    context: Arc<ServerContext>,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_limits(config, SessionLimits::default())
    }

    /// Igual que `new`, con límites de sesión a medida
    pub fn with_limits(config: Config, limits: SessionLimits) -> Result<Self> {
        let content_root = config.content_dir.canonicalize().map_err(|e| {
            ServerError::Config(format!(
                "cannot resolve content directory {}: {}",
                config.content_dir.display(),
                e
            ))
        })?;

        let whitelist = Whitelist::new(
            config.whitelist_enabled,
            &config.whitelist_ips,
            &config.whitelist_files,
        );

        let access_log = match config.access_log_path() {
            Some(path) => AccessLog::open(path)?,
            None => AccessLog::disabled(),
        };

        let context = ServerContext::new(whitelist, access_log).with_limits(limits);

        Ok(Self {
            config,
            content_root: Arc::from(content_root),
            context: Arc::new(context),
        })
    }

    /// Abre el socket en la dirección configurada
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.address();
        TcpListener::bind(&addr).map_err(|source| ServerError::Bind { addr, source })
    }

    /// `bind` + `run`
    pub fn serve(&self, shutdown: &Shutdown) -> Result<()> {
        let listener = self.bind()?;
        self.run(listener, shutdown)
    }

    /// Acepta conexiones hasta que se active `shutdown`
    pub fn run(&self, listener: TcpListener, shutdown: &Shutdown) -> Result<()> {
        listener.set_nonblocking(true)?;

        let context = Arc::clone(&self.context);
        let pool = WorkerPool::new(self.config.thread_pool_size, QUEUE_CAPACITY, move |item: WorkItem| {
            handle_connection(item, &context)
        })?;

        log::info!("Server listening on {}", listener.local_addr()?);

        while !shutdown.is_triggered() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // El socket aceptado puede heredar el modo no bloqueante
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::warn!("could not configure connection from {}: {}", peer, e);
                        continue;
                    }

                    let item = WorkItem {
                        stream,
                        peer,
                        content_root: Arc::clone(&self.content_root),
                        show_extension: self.config.show_file_extension,
                    };

                    if let Err(e) = pool.submit(item) {
                        log::debug!("connection from {} dropped: {}", peer, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("accept() failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        log::info!("Graceful shutdown initiated");
        pool.shutdown();
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.context.metrics
    }
}
