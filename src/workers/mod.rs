//! # Sistema de Workers
//! src/workers/mod.rs
//!
//! Pool fijo de threads que atiende las conexiones aceptadas:
//! - `queue`: cola FIFO acotada con señal de cierre
//! - `pool`: workers, backpressure y apagado

pub mod pool;
pub mod queue;

pub use pool::{WorkerPool, QUEUE_CAPACITY};
pub use queue::WorkQueue;
