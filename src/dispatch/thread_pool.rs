//! # Pool de Threads
//! src/dispatch/thread_pool.rs
//!
//! N workers de vida larga, cada uno en loop: sacar de la cola (bloqueando),
//! ejecutar, repetir. El apagado encola un centinela por worker detrás de
//! todo lo pendiente, así que nada en curso se interrumpe y todo lo encolado
//! antes del apagado se ejecuta.

use std::io;
use std::thread::JoinHandle;

use super::queue::WorkQueue;
use super::{run_contained, spawn_named, ThreadBody, Work};

enum Job<W> {
    Run(W),
    /// Centinela: el worker que lo saca termina su loop
    Stop,
}

/// Pool de threads de tamaño fijo
pub struct ThreadPool<W: Work> {
    queue: WorkQueue<Job<W>>,
    workers: Vec<JoinHandle<()>>,
}

impl<W: Work> ThreadPool<W> {
    /// Arranca `size` workers
    pub fn new(size: usize) -> io::Result<Self> {
        Self::with_spawner(size, spawn_named)
    }

    /// Si un `spawn` falla, el pool parcial se suelta y `Drop` detiene a
    /// los workers que ya arrancaron
    pub(crate) fn with_spawner(
        size: usize,
        mut spawn: impl FnMut(String, ThreadBody) -> io::Result<JoinHandle<()>>,
    ) -> io::Result<Self> {
        let mut pool = Self {
            queue: WorkQueue::new(),
            workers: Vec::with_capacity(size),
        };

        for id in 0..size {
            let queue = pool.queue.clone();
            let handle = spawn(
                format!("pool-worker-{}", id),
                Box::new(move || Self::worker_loop(id, queue)),
            )?;
            pool.workers.push(handle);
        }

        Ok(pool)
    }

    fn worker_loop(id: usize, queue: WorkQueue<Job<W>>) {
        let name = format!("pool-worker-{}", id);
        tracing::debug!(worker = %name, "worker started");

        loop {
            match queue.pop() {
                Job::Run(work) => run_contained(&name, work),
                Job::Stop => break,
            }
        }

        tracing::debug!(worker = %name, "worker stopped");
    }

    /// Encola al final de la cola
    pub fn submit(&self, work: W) {
        self.queue.push(Job::Run(work));
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Trabajo encolado que todavía ningún worker tomó
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Encola un centinela por worker y espera a que todos terminen
    pub fn shutdown(mut self) {
        self.stop_workers();
    }

    fn stop_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        for _ in 0..self.workers.len() {
            self.queue.push(Job::Stop);
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("pool worker exited abnormally");
            }
        }
    }
}

impl<W: Work> Drop for ThreadPool<W> {
    fn drop(&mut self) {
        self.stop_workers();
    }
}
