//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Conecta Listener → Despachador → pipeline y es dueño del apagado.
//! El socket se abre una sola vez en `bind`; `run` bloquea el thread que lo
//! llama hasta que alguien dispare el [`ShutdownHandle`].

use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use super::connection::Connection;
use super::listener::Listener;
use super::pipeline::Pipeline;
use super::shutdown::ShutdownHandle;
use crate::config::{Config, Mode};
use crate::dispatch::{ActorQueue, CooperativeDispatcher, Task, ThreadPool};
use crate::error::ServerError;
use crate::handler::Handler;
use crate::metrics::MetricsCollector;

/// Servidor HTTP/1.1 con la estrategia de despacho elegida en `Config`
pub struct Server {
    listener: Listener,
    pipeline: Pipeline,
    shutdown: ShutdownHandle,
    mode: Mode,
    workers: usize,
    max_in_flight: usize,
}

impl Server {
    /// Valida la configuración y abre el socket de escucha
    pub fn bind(config: &Config, handler: Arc<dyn Handler>) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let listener = Listener::bind(&config.host, config.port, config.backlog)?;
        let shutdown = ShutdownHandle::new(listener.local_addr());
        let pipeline = Pipeline::new(handler, MetricsCollector::new(), config.read_timeout());

        Ok(Self {
            listener,
            pipeline,
            shutdown,
            mode: config.mode,
            workers: config.workers,
            max_in_flight: config.max_in_flight,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.pipeline.metrics().clone()
    }

    /// Acepta conexiones hasta el apagado
    pub fn run(self) -> Result<(), ServerError> {
        let Self {
            listener,
            pipeline,
            shutdown,
            mode,
            workers,
            max_in_flight,
        } = self;

        tracing::info!(addr = %listener.local_addr(), %mode, "server listening");
        let metrics = pipeline.metrics().clone();

        let result = match mode {
            Mode::Threads => {
                let pool = ThreadPool::new(workers).map_err(ServerError::Runtime)?;
                tracing::info!(workers = pool.size(), "thread pool ready");

                accept_loop(&listener, &shutdown, |conn| {
                    pool.submit(Task::new(conn, pipeline.clone()))
                });

                tracing::info!(pending = pool.pending(), "stopping thread pool");
                pool.shutdown();
                Ok(())
            }
            Mode::Actor => {
                let actors = ActorQueue::new(workers).map_err(ServerError::Runtime)?;
                tracing::info!(workers = actors.size(), "actor workers ready");

                accept_loop(&listener, &shutdown, |conn| {
                    actors.submit(Task::new(conn, pipeline.clone()))
                });

                tracing::info!("stopping actor queue");
                actors.shutdown();
                Ok(())
            }
            Mode::Cooperative => {
                CooperativeDispatcher::new(max_in_flight)?.run(listener, pipeline, shutdown)
            }
        };

        tracing::info!(metrics = %metrics.to_json(), "server stopped");
        result
    }
}

/// Loop de accept bloqueante de los despachadores basados en threads
///
/// Un error de `accept` se registra y el loop sigue.
fn accept_loop(
    listener: &Listener,
    shutdown: &ShutdownHandle,
    mut dispatch: impl FnMut(Connection<TcpStream>),
) {
    loop {
        let accepted = listener.accept();
        if shutdown.is_triggered() {
            break;
        }

        match accepted {
            Ok(conn) => {
                tracing::trace!(peer = %conn.peer(), "accepted");
                dispatch(conn);
            }
            Err(e) => tracing::warn!(error = %e, "accept failed"),
        }
    }
}
