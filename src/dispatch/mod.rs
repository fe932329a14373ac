//! # Despachadores
//! src/dispatch/mod.rs
//!
//! Deciden en qué contexto de ejecución corre el pipeline de cada conexión
//! aceptada. Hay tres, mutuamente excluyentes y elegidos al arrancar:
//!
//! - [`ThreadPool`]: N threads que sacan tareas de una cola FIFO compartida
//! - [`CooperativeDispatcher`]: un solo thread con un runtime tokio, una
//!   tarea asíncrona por conexión
//! - [`ActorQueue`]: listener, cola y workers aislados que solo se hablan
//!   por canales; un worker recibe trabajo solo cuando lo pide

pub mod actor;
pub mod cooperative;
pub mod queue;
pub mod thread_pool;

pub use actor::ActorQueue;
pub use cooperative::CooperativeDispatcher;
pub use queue::WorkQueue;
pub use thread_pool::ThreadPool;

use std::any::Any;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::server::{Connection, Pipeline};

/// Unidad de trabajo que un despachador entrega a un worker
///
/// Se ejecuta a lo sumo una vez, por un único worker.
pub trait Work: Send + 'static {
    fn run(self);
}

impl<F> Work for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self) {
        self()
    }
}

/// Una conexión aceptada junto con el pipeline que la va a atender
pub struct Task {
    conn: Connection<TcpStream>,
    pipeline: Pipeline,
}

impl Task {
    pub fn new(conn: Connection<TcpStream>, pipeline: Pipeline) -> Self {
        Self { conn, pipeline }
    }

    pub fn peer(&self) -> SocketAddr {
        self.conn.peer()
    }
}

impl Work for Task {
    fn run(self) {
        self.pipeline.serve(self.conn);
    }
}

/// Cuerpo de un thread de despachador
pub(crate) type ThreadBody = Box<dyn FnOnce() + Send + 'static>;

/// Arranca un thread con nombre; los despachadores lo reciben como
/// parámetro para poder simular fallas de `spawn` en los tests
pub(crate) fn spawn_named(name: String, body: ThreadBody) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name).spawn(body)
}

/// Corre `work` sin dejar que un pánico tumbe al worker que lo ejecuta
pub(crate) fn run_contained<W: Work>(worker: &str, work: W) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| work.run())) {
        tracing::error!(worker, reason = panic_reason(payload.as_ref()), "work item panicked");
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Response, StatusCode};
    use crate::handler::HandlerResult;
    use crate::metrics::MetricsCollector;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::sync::Arc;

    #[test]
    fn test_closure_is_work() {
        let (tx, rx) = mpsc::channel();
        let work = move || tx.send(7).unwrap();
        work.run();
        assert_eq!(rx.recv().unwrap(), 7);
    }

    #[test]
    fn test_run_contained_swallows_panic() {
        run_contained("test", || panic!("boom"));
        run_contained("test", || std::panic::panic_any(String::from("owned boom")));
    }

    #[test]
    fn test_task_runs_pipeline() {
        fn ok(_req: &Request) -> HandlerResult {
            Ok(Response::new(StatusCode::OK).with_chunk("hi"))
        }

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        let (stream, peer) = listener.accept().unwrap();
        let pipeline = Pipeline::new(Arc::new(ok), MetricsCollector::new(), None);
        let task = Task::new(Connection::accept(stream, peer).unwrap(), pipeline);
        assert_eq!(task.peer(), client.local_addr().unwrap());

        task.run();

        let mut buf = String::new();
        client.read_to_string(&mut buf).unwrap();
        assert!(buf.starts_with("HTTP/1.1 200 OK"));
        assert!(buf.ends_with("\r\n\r\nhi"));
    }
}
