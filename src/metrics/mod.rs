//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Este módulo implementa la recolección y agregación de métricas del servidor:
//! - Contadores de requests y bytes servidos
//! - Tiempo de respuesta (promedio, mínimo, máximo)
//! - Memoria pico y tiempo de CPU del proceso
//! - Reporte JSON del endpoint de salud

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
