//! # Cola de Actores
//! src/dispatch/actor.rs
//!
//! Contextos aislados que no comparten memoria mutable y se coordinan solo
//! con mensajes:
//!
//! ```text
//! listener ──(rendezvous)──▶ cola ──(rendezvous)──▶ worker 0..N
//!                             ▲                        │
//!                             └──────── demanda ───────┘
//! ```
//!
//! La cola tiene como mucho una conexión a la vez. Cada worker libre manda
//! una demanda con su propio canal de entrega y bloquea; la cola empareja la
//! conexión que tiene con la primera demanda que llega. Un worker ocupado no
//! pide, así que nunca recibe una segunda conexión mientras otro está libre.
//!
//! El apagado es por desconexión: se suelta el emisor del listener, la cola
//! entrega lo que tenga y termina, y al cerrarse la cola los workers ven sus
//! canales desconectados.
//!
//! Lo único que los workers comparten es el `MetricsCollector` del pipeline:
//! solo suman contadores y ningún contexto lo lee para decidir a quién
//! despachar.

use std::io;
use std::sync::mpsc::{self, Receiver, SendError, Sender, SyncSender};
use std::thread::JoinHandle;

use super::{run_contained, spawn_named, ThreadBody, Work};

/// Despachador de actores: un thread de cola y N workers
pub struct ActorQueue<W: Work> {
    mailbox: Option<SyncSender<W>>,
    queue: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl<W: Work> ActorQueue<W> {
    pub fn new(workers: usize) -> io::Result<Self> {
        Self::with_spawner(workers, spawn_named)
    }

    /// Si un `spawn` falla, los canales se sueltan antes que `actors`, así
    /// que los workers ya arrancados ven la desconexión y `Drop` los une
    pub(crate) fn with_spawner(
        workers: usize,
        mut spawn: impl FnMut(String, ThreadBody) -> io::Result<JoinHandle<()>>,
    ) -> io::Result<Self> {
        let mut actors = Self {
            mailbox: None,
            queue: None,
            workers: Vec::with_capacity(workers),
        };

        let (mailbox, inbox) = mpsc::sync_channel::<W>(0);
        let (demand_tx, demand_rx) = mpsc::channel::<SyncSender<W>>();

        for id in 0..workers {
            let demands = demand_tx.clone();
            let handle = spawn(
                format!("actor-worker-{}", id),
                Box::new(move || Self::worker_loop(id, demands)),
            )?;
            actors.workers.push(handle);
        }
        drop(demand_tx);

        let queue = spawn(
            "actor-queue".to_string(),
            Box::new(move || Self::queue_loop(inbox, demand_rx)),
        )?;

        actors.mailbox = Some(mailbox);
        actors.queue = Some(queue);
        Ok(actors)
    }

    /// Contexto cola: toma un item y bloquea hasta que un worker lo pida
    fn queue_loop(inbox: Receiver<W>, demands: Receiver<SyncSender<W>>) {
        tracing::debug!("actor queue started");

        'items: while let Ok(mut work) = inbox.recv() {
            loop {
                let Ok(worker) = demands.recv() else {
                    tracing::error!("no actor workers left, dropping work");
                    break 'items;
                };

                // El worker que pidió ya no está; probar con el siguiente
                match worker.send(work) {
                    Ok(()) => break,
                    Err(SendError(back)) => work = back,
                }
            }
        }

        tracing::debug!("actor queue stopped");
    }

    /// Contexto worker: pedir, esperar la entrega, ejecutar, repetir
    fn worker_loop(id: usize, demands: Sender<SyncSender<W>>) {
        let name = format!("actor-worker-{}", id);
        tracing::debug!(worker = %name, "worker started");

        loop {
            let (reply_tx, reply_rx) = mpsc::sync_channel(0);
            if demands.send(reply_tx).is_err() {
                break;
            }

            match reply_rx.recv() {
                Ok(work) => run_contained(&name, work),
                Err(_) => break,
            }
        }

        tracing::debug!(worker = %name, "worker stopped");
    }

    /// Entrega `work` al contexto cola
    ///
    /// Bloquea hasta que la cola lo tome, es decir, hasta que haya entregado
    /// el anterior a algún worker.
    pub fn submit(&self, work: W) {
        let delivered = match &self.mailbox {
            Some(mailbox) => mailbox.send(work).is_ok(),
            None => false,
        };

        if !delivered {
            tracing::warn!("actor queue is gone, dropping work");
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Cierra el buzón y espera a que la cola y los workers terminen
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.mailbox.take());

        if let Some(queue) = self.queue.take() {
            if queue.join().is_err() {
                tracing::error!("actor queue exited abnormally");
            }
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("actor worker exited abnormally");
            }
        }
    }
}

impl<W: Work> Drop for ActorQueue<W> {
    fn drop(&mut self) {
        self.stop();
    }
}
