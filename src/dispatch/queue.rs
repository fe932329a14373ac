//! # Cola de Trabajo
//! src/dispatch/queue.rs
//!
//! Cola FIFO thread-safe sin límite de capacidad. El listener encola sin
//! bloquear nunca; los workers bloquean en `pop` hasta que haya algo.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Cola FIFO compartida entre un productor y varios consumidores
pub struct WorkQueue<T> {
    items: Arc<Mutex<VecDeque<T>>>,

    /// Condvar para despertar workers cuando llega un item
    condvar: Arc<Condvar>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Encola al final; nunca bloquea
    pub fn push(&self, item: T) {
        self.items().push_back(item);

        // Notificar a un worker esperando
        self.condvar.notify_one();
    }

    /// Desencola el item más antiguo
    ///
    /// Bloquea hasta que haya un item disponible
    pub fn pop(&self) -> T {
        let mut items = self.items();

        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }

            items = self
                .condvar
                .wait(items)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        self.items().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
