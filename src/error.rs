//! # Errores del Servidor
//! src/error.rs
//!
//! Errores de arranque y del pool de workers. Los fallos por request
//! (404, 403, escrituras cortadas) no pasan por aquí: se resuelven dentro
//! de la sesión de cada conexión.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// La cola de conexiones está llena (backpressure)
    #[error("work queue is full")]
    QueueFull,

    /// El pool ya recibió la orden de apagado
    #[error("worker pool is shutting down")]
    ShuttingDown,
}

pub type Result<T> = std::result::Result<T, ServerError>;
