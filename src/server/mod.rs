//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor que:
//! 1. Escucha en un puerto y acepta conexiones (`tcp`)
//! 2. Encola cada conexión para el pool de workers
//! 3. Atiende los requests de la conexión con keep-alive (`session`)
//! 4. Envía archivos con soporte de caché, rangos y 304 (`files`)

pub mod files;
pub mod session;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use session::{ServerContext, SessionLimits, WorkItem};
pub use tcp::Server;
