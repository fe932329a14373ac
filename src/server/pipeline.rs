//! # Pipeline por Conexión
//! src/server/pipeline.rs
//!
//! Lo que corre cada worker, sea un thread del pool, un actor o una tarea
//! cooperativa:
//!
//! ```text
//! parse → handler → respond → close
//! ```
//!
//! Cualquier falla queda aislada en su conexión: se registra, la conexión se
//! cierra sin respuesta y el worker sigue con la próxima. Un pánico dentro
//! del handler se trata igual que un error del handler.

use std::any::Any;
use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::connection::Connection;
use crate::error::ServerError;
use crate::handler::{Handler, HandlerError};
use crate::http::{ParseError, Request, RequestParser, Responder, Response};
use crate::metrics::{MetricsCollector, Outcome};

/// Estado compartido que necesita cada worker para atender una conexión
#[derive(Clone)]
pub struct Pipeline {
    handler: Arc<dyn Handler>,
    metrics: MetricsCollector,
    read_timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        handler: Arc<dyn Handler>,
        metrics: MetricsCollector,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            handler,
            metrics,
            read_timeout,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Atiende una conexión bloqueante de principio a fin
    pub fn serve(&self, conn: Connection<TcpStream>) {
        let started = Instant::now();
        let peer = conn.peer();
        self.metrics.connection_opened();

        let result = self.process(&conn);
        drop(conn);

        self.finish(peer, result, started);
    }

    /// Atiende una conexión asíncrona; cede el control en cada lectura y
    /// escritura
    pub async fn serve_async(&self, mut conn: Connection<tokio::net::TcpStream>) {
        let started = Instant::now();
        let peer = conn.peer();
        let local_port = conn.local_port();
        self.metrics.connection_opened();

        let result = self
            .process_async(conn.stream_mut(), peer, local_port)
            .await;
        drop(conn);

        self.finish(peer, result, started);
    }

    fn process(&self, conn: &Connection<TcpStream>) -> Result<u16, ServerError> {
        let stream = conn.stream();
        if self.read_timeout.is_some() {
            stream
                .set_read_timeout(self.read_timeout)
                .map_err(ParseError::from)?;
        }

        let mut reader = BufReader::new(stream);
        let request = RequestParser::parse(&mut reader, conn.peer(), conn.local_port())?;

        let response = self.call_handler(&request)?;

        let mut writer = stream;
        Responder::respond(&mut writer, &response).map_err(ServerError::Write)?;
        Ok(response.status().as_u16())
    }

    async fn process_async(
        &self,
        stream: &mut tokio::net::TcpStream,
        peer: SocketAddr,
        local_port: u16,
    ) -> Result<u16, ServerError> {
        let (read_half, mut write_half) = stream.split();
        let mut reader = tokio::io::BufReader::new(read_half);

        let parse = RequestParser::parse_async(&mut reader, peer, local_port);
        let request = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, parse)
                .await
                .map_err(|_| ParseError::Io(io::Error::new(io::ErrorKind::TimedOut, "read timed out")))??,
            None => parse.await?,
        };

        let response = self.call_handler(&request)?;

        Responder::respond_async(&mut write_half, &response)
            .await
            .map_err(ServerError::Write)?;
        Ok(response.status().as_u16())
    }

    fn call_handler(&self, request: &Request) -> Result<Response, ServerError> {
        tracing::trace!(method = %request.method(), path = request.path(), "calling handler");

        match panic::catch_unwind(AssertUnwindSafe(|| self.handler.call(request))) {
            Ok(result) => Ok(result?),
            Err(payload) => Err(HandlerError::new(panic_message(payload.as_ref())).into()),
        }
    }

    /// Registra el resultado; la conexión ya está cerrada en este punto
    fn finish(&self, peer: SocketAddr, result: Result<u16, ServerError>, started: Instant) {
        let outcome = match result {
            Ok(status) => {
                tracing::debug!(%peer, status, "responded");
                Outcome::Responded { status }
            }
            Err(err) if err.is_silent() => {
                tracing::debug!(%peer, "peer closed without sending a request");
                Outcome::ClosedSilently
            }
            Err(ServerError::Parse(err)) => {
                tracing::warn!(%peer, error = %err, "dropping unparseable request");
                Outcome::ParseFailed
            }
            Err(ServerError::Handler(err)) => {
                tracing::error!(%peer, error = %err, "handler failed");
                Outcome::HandlerFailed
            }
            Err(err) => {
                tracing::warn!(%peer, error = %err, "could not write response");
                Outcome::WriteFailed
            }
        };

        self.metrics.connection_closed(outcome, started.elapsed());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", message)
    } else {
        "handler panicked".to_string()
    }
}
