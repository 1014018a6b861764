//! # Static Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente de archivos estáticos: pool fijo de
//! workers, conexiones keep-alive, caché LRU en memoria, requests
//! condicionales y por rango, y un endpoint de salud en JSON.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing de requests, status codes, responses y tipos MIME
//! - `resolver`: Traducción de paths de URL a archivos (dos modos de URL)
//! - `cache`: Caché LRU de archivos chicos validada por mtime
//! - `server`: Listener TCP, sesiones keep-alive y envío de archivos
//! - `workers`: Pool de workers sobre una cola FIFO acotada
//! - `whitelist`: Filtro de IPs y paths
//! - `metrics`: Recolección de métricas y reporte de salud
//! - `access_log`: Log de accesos en formato combined
//! - `config`: Configuración desde JSON, CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_server::config::Config;
//! use static_server::server::Server;
//! use static_server::shutdown::Shutdown;
//!
//! let config = Config::load().expect("config");
//! let server = Server::new(config).expect("server");
//! server.serve(&Shutdown::new()).expect("Error al iniciar servidor");
//! ```

pub mod access_log;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod resolver;
pub mod server;
pub mod shutdown;
pub mod whitelist;
pub mod workers;

pub use error::{Result, ServerError};
