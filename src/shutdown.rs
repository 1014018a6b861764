//! # Token de Cancelación
//! src/shutdown.rs
//!
//! Flag compartido que el listener y el pool consultan entre operaciones
//! bloqueantes. Los handlers de señales (SIGINT/SIGTERM) solo lo activan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token de cancelación clonable
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solicita el apagado. Es idempotente.
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
