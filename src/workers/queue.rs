//! # Cola FIFO Acotada
//! src/workers/queue.rs
//!
//! Cola thread-safe con capacidad máxima. Los consumidores bloquean en un
//! `Condvar` mientras la cola está vacía; `close` los despierta a todos.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Cola FIFO acotada con señal de cierre
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Notifica cuando llega un item o se cierra la cola
    condvar: Condvar,

    /// Capacidad máxima de la cola
    max_capacity: usize,
}

impl<T> WorkQueue<T> {
    /// Crea una nueva cola con capacidad máxima
    pub fn new(max_capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(max_capacity),
                closed: false,
            }),
            condvar: Condvar::new(),
            max_capacity,
        }
    }

    /// Encola un item
    ///
    /// Si la cola está llena o cerrada, devuelve el item al llamador.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();

        if state.closed || state.items.len() >= self.max_capacity {
            return Err(item);
        }

        state.items.push_back(item);

        // Notificar a un worker esperando
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola el item más antiguo
    ///
    /// Bloquea mientras la cola esté vacía. Retorna `None` en cuanto la cola
    /// se cierra, aunque queden items pendientes: esos los recoge `drain`.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return None;
            }

            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }

            self.condvar.wait(&mut state);
        }
    }

    /// Cierra la cola y despierta a todos los consumidores
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Extrae todos los items pendientes
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().items.drain(..).collect()
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna la capacidad máxima
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }
}
