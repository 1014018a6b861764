//! # Configuración del Servidor
//! src/config.rs
//!
//! La configuración vive en un archivo JSON y puede sobrescribirse desde la
//! línea de comandos o variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### Archivo de configuración
//! ```json
//! {
//!   "server-port": 8080,
//!   "server-host": "any",
//!   "server-content-directory": "default",
//!   "show-file-extension": false,
//!   "thread-pool-size": 4,
//!   "whitelist-enabled": true,
//!   "whitelist-ips": ["127.0.0.1", "192.168.1.0/24"],
//!   "whitelist-files": ["/index.html", "/docs/"],
//!   "enable-access-logging": true,
//!   "access-log-file": "log/access.log"
//! }
//! ```
//!
//! ### CLI
//! ```bash
//! ./static_server --config ./config.json --port 9000 --threads 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SERVER_CONFIG=/etc/static_server.json SERVER_PORT=9000 ./static_server
//! ```

use crate::error::{Result, ServerError};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Valor especial de `server-content-directory`: `<dir del config>/server-content`
const DEFAULT_CONTENT_KEYWORD: &str = "default";

/// Archivo usado cuando no se pasa `--config`
const FALLBACK_CONFIG_FILE: &str = "config.json";

/// Argumentos de línea de comandos
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "static_server")]
#[command(about = "Servidor HTTP/1.1 concurrente de archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Archivo de configuración JSON
    #[arg(short, long, env = "SERVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Host: `any`, `localhost` o una IP literal
    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,

    /// Directorio raíz del contenido servido
    #[arg(long = "content-dir", env = "SERVER_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Sirve los archivos con su extensión visible en la URL
    #[arg(long = "show-extension")]
    pub show_extension: bool,

    /// Número de workers del pool
    #[arg(long = "threads", env = "SERVER_THREADS")]
    pub threads: Option<usize>,
}

/// Configuración del servidor
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    #[serde(rename = "server-port")]
    pub port: u16,

    #[serde(rename = "server-host")]
    pub host: String,

    #[serde(rename = "server-content-directory")]
    pub content_dir: PathBuf,

    pub show_file_extension: bool,

    pub thread_pool_size: usize,

    // === Whitelist ===
    pub whitelist_enabled: bool,
    pub whitelist_ips: Vec<String>,
    pub whitelist_files: Vec<String>,

    // === Access log ===
    pub enable_access_logging: bool,
    pub access_log_file: PathBuf,
}

impl Config {
    /// Construye la configuración desde los argumentos del proceso
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Aplica la cadena archivo → overrides de CLI
    ///
    /// Sin `--config` se usa `./config.json` si existe; si no, los valores
    /// por defecto.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let config_path = cli.config.clone().or_else(|| {
            let fallback = PathBuf::from(FALLBACK_CONFIG_FILE);
            fallback.is_file().then_some(fallback)
        });

        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => {
                let mut config = Self::default();
                config.resolve_paths(Path::new("."))?;
                config
            }
        };

        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(host) = cli.host {
            config.host = host;
        }
        if let Some(content_dir) = cli.content_dir {
            config.content_dir = content_dir;
        }
        if cli.show_extension {
            config.show_file_extension = true;
        }
        if let Some(threads) = cli.threads {
            config.thread_pool_size = threads;
        }

        Ok(config)
    }

    /// Lee un archivo JSON. Todas las claves son opcionales.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Self::from_json_str(&contents, base_dir)
    }

    /// Parsea JSON resolviendo paths relativos contra `base_dir`
    pub fn from_json_str(json: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)
            .map_err(|e| ServerError::Config(format!("invalid JSON: {}", e)))?;
        config.resolve_paths(base_dir)?;
        Ok(config)
    }

    /// `"default"` se convierte en `<base_dir>/server-content` (creado si no
    /// existe) y el access log relativo cuelga de `base_dir`.
    fn resolve_paths(&mut self, base_dir: &Path) -> Result<()> {
        if self.content_dir.as_os_str() == DEFAULT_CONTENT_KEYWORD {
            self.content_dir = base_dir.join("server-content");
            fs::create_dir_all(&self.content_dir)?;
        }

        if self.access_log_file.is_relative() {
            self.access_log_file = base_dir.join(&self.access_log_file);
        }

        Ok(())
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.host = "any".to_string();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        match self.host.as_str() {
            "any" => format!("0.0.0.0:{}", self.port),
            "localhost" => format!("127.0.0.1:{}", self.port),
            // Las IPv6 van entre corchetes: `[::1]:8080`
            other => match other.parse::<IpAddr>() {
                Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
                Err(_) => format!("{}:{}", other, self.port),
            },
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == 0 {
            return Err("Port must be in 1-65535".to_string());
        }

        if !matches!(self.host.as_str(), "any" | "localhost") && self.host.parse::<IpAddr>().is_err() {
            return Err(format!(
                "Host must be 'any', 'localhost' or an IP address, got '{}'",
                self.host
            ));
        }

        if !self.content_dir.is_dir() {
            return Err(format!(
                "Content directory {} does not exist or is not a directory",
                self.content_dir.display()
            ));
        }

        if self.thread_pool_size == 0 {
            return Err("Thread pool size must be >= 1".to_string());
        }

        Ok(())
    }

    /// Path del access log, si está habilitado
    pub fn access_log_path(&self) -> Option<&Path> {
        self.enable_access_logging.then_some(self.access_log_file.as_path())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        log::info!("Server configuration:");
        log::info!("  address:        {}", self.address());
        log::info!("  content dir:    {}", self.content_dir.display());
        log::info!(
            "  file extension: {}",
            if self.show_file_extension { "visible" } else { "hidden" }
        );
        log::info!("  worker threads: {}", self.thread_pool_size);

        if self.whitelist_enabled {
            log::info!(
                "  whitelist:      {} IP entries, {} file entries",
                self.whitelist_ips.len(),
                self.whitelist_files.len()
            );
        } else {
            log::info!("  whitelist:      disabled");
        }

        match self.access_log_path() {
            Some(path) => log::info!("  access log:     {}", path.display()),
            None => log::info!("  access log:     disabled"),
        }
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            content_dir: PathBuf::from(DEFAULT_CONTENT_KEYWORD),
            show_file_extension: false,
            thread_pool_size: 4,
            whitelist_enabled: false,
            whitelist_ips: Vec::new(),
            whitelist_files: Vec::new(),
            enable_access_logging: false,
            access_log_file: PathBuf::from("log/access.log"),
        }
    }
}
