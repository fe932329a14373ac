//! # Despachador Cooperativo
//! src/dispatch/cooperative.rs
//!
//! Un solo thread del sistema operativo con un runtime tokio
//! `current_thread`. El runtime es dueño del loop de `accept`; cada conexión
//! aceptada es una tarea que corre el pipeline y cede el control en cada
//! lectura o escritura, así que las demás tareas avanzan mientras una espera
//! a su peer. No hay paralelismo: el handler corre sin ceder.
//!
//! Sin límite, cualquier cantidad de tareas puede estar en vuelo a la vez;
//! con `max_in_flight > 0` el loop deja de aceptar hasta que se libere un
//! lugar.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::ServerError;
use crate::server::{Connection, Listener, Pipeline, ShutdownHandle};

pub struct CooperativeDispatcher {
    runtime: Runtime,
    max_in_flight: usize,
}

impl CooperativeDispatcher {
    /// Levanta el runtime; `max_in_flight == 0` significa sin límite
    pub fn new(max_in_flight: usize) -> Result<Self, ServerError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        Ok(Self {
            runtime,
            max_in_flight,
        })
    }

    /// Entra al runtime y acepta hasta que se pida el apagado
    ///
    /// Al salir espera a que terminen las tareas en vuelo.
    pub fn run(
        self,
        listener: Listener,
        pipeline: Pipeline,
        shutdown: ShutdownHandle,
    ) -> Result<(), ServerError> {
        let Self {
            runtime,
            max_in_flight,
        } = self;

        runtime.block_on(accept_loop(listener, pipeline, shutdown, max_in_flight))
    }
}

async fn accept_loop(
    listener: Listener,
    pipeline: Pipeline,
    shutdown: ShutdownHandle,
    max_in_flight: usize,
) -> Result<(), ServerError> {
    let listener = listener.into_std();
    listener.set_nonblocking(true).map_err(ServerError::Runtime)?;
    let listener = tokio::net::TcpListener::from_std(listener).map_err(ServerError::Runtime)?;

    let admission = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
    let mut tasks = JoinSet::new();

    loop {
        let permit = match &admission {
            Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => break,
            },
            None => None,
        };

        let accepted = listener.accept().await;
        if shutdown.is_triggered() {
            break;
        }

        match accepted {
            Ok((stream, peer)) => match Connection::accept_async(stream, peer) {
                Ok(conn) => {
                    let pipeline = pipeline.clone();
                    tasks.spawn(async move {
                        pipeline.serve_async(conn).await;
                        drop(permit);
                    });
                }
                Err(e) => tracing::warn!(%peer, error = %e, "dropping connection"),
            },
            Err(e) => tracing::warn!(error = %e, "accept failed"),
        }

        while let Some(result) = tasks.try_join_next() {
            log_join(result);
        }
    }

    drop(listener);

    let in_flight = tasks.len();
    if in_flight > 0 {
        tracing::info!(in_flight, "waiting for in-flight connections");
    }
    while let Some(result) = tasks.join_next().await {
        log_join(result);
    }

    Ok(())
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "connection task failed");
    }
}
