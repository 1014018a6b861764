//! # Pool de Workers
//! src/workers/pool.rs
//!
//! Número fijo de threads consumiendo una `WorkQueue` compartida. Cada item
//! se procesa una sola vez, fuera del lock de la cola.
//!
//! - `submit` con la cola llena rechaza el item y lo descarta (para una
//!   conexión, eso la cierra sin escribir nada).
//! - `shutdown` cierra la cola, espera a que los workers terminen lo que
//!   están procesando y descarta los items que seguían encolados.

use crate::error::{Result, ServerError};
use crate::workers::queue::WorkQueue;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Capacidad de la cola de conexiones
pub const QUEUE_CAPACITY: usize = 256;

type Handler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Pool de workers genérico sobre el tipo de item
pub struct WorkerPool<T: Send + 'static> {
    queue: Arc<WorkQueue<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `num_workers` threads que aplican `handler` a cada item
    pub fn new<F>(num_workers: usize, capacity: usize, handler: F) -> Result<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let queue = Arc::new(WorkQueue::new(capacity));
        let handler: Handler<T> = Arc::new(handler);

        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(num_workers),
        };

        for id in 0..num_workers {
            let name = format!("worker-{}", id);
            let queue = Arc::clone(&pool.queue);
            let handler = Arc::clone(&handler);

            // Si falla el spawn, `pool` se descarta y Drop detiene a los ya lanzados
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(name, queue, handler))?;
            pool.workers.push(handle);
        }

        log::info!(
            "Worker pool started: {} workers, queue capacity {}",
            num_workers,
            capacity
        );

        Ok(pool)
    }

    /// Encola un item
    ///
    /// Con la cola llena o el pool apagándose, el item se descarta.
    pub fn submit(&self, item: T) -> Result<()> {
        match self.queue.push(item) {
            Ok(()) => Ok(()),
            Err(_rejected) if self.queue.is_closed() => Err(ServerError::ShuttingDown),
            Err(_rejected) => {
                log::warn!(
                    "Work queue full ({} items), dropping connection",
                    self.queue.max_capacity()
                );
                Err(ServerError::QueueFull)
            }
        }
    }

    /// Items esperando un worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Detiene el pool
    ///
    /// Los items en proceso terminan normalmente; los que seguían en la cola
    /// se descartan sin procesarse.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.workers.is_empty() && self.queue.is_closed() {
            return;
        }

        log::info!("Shutting down worker pool");
        self.queue.close();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("worker thread exited abnormally");
            }
        }

        let discarded = self.queue.drain();
        if !discarded.is_empty() {
            log::info!("Discarded {} queued connections", discarded.len());
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Loop principal de un worker
fn worker_loop<T>(name: String, queue: Arc<WorkQueue<T>>, handler: Handler<T>) {
    log::debug!("Worker {} started", name);

    while let Some(item) = queue.pop_blocking() {
        // Un panic en un item no debe tumbar al worker
        if panic::catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
            log::error!("Worker {} recovered from a panic while handling an item", name);
        }
    }

    log::debug!("Worker {} stopped", name);
}
