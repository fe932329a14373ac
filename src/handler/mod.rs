//! # Contrato del Handler
//! src/handler/mod.rs
//!
//! El handler es la aplicación: una función pura `Request -> Response`. El
//! servidor no enruta ni interpreta nada; solo entrega el request parseado
//! y escribe lo que el handler devuelve.
//!
//! ```text
//! Request → Handler → Response
//! ```
//!
//! Un handler que falla (o que entra en pánico) no genera respuesta de
//! error: la conexión se cierra sin enviar nada.

pub mod files;

pub use files::FileServingApp;

use thiserror::Error;

use crate::http::{Request, Response};

/// Falla reportada por un handler
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        HandlerError::new(err.to_string())
    }
}

/// Resultado de invocar un handler
pub type HandlerResult = Result<Response, HandlerError>;

/// Aplicación que atiende requests
///
/// Se comparte entre todos los workers (`Send + Sync`), así que no debe
/// tener estado mutable sin sincronizar.
///
/// Cualquier closure `Fn(&Request) -> HandlerResult` es un handler:
///
/// ```
/// use dispatch_server::handler::{Handler, HandlerResult};
/// use dispatch_server::http::{Request, Response, StatusCode};
///
/// let hello = |_req: &Request| -> HandlerResult {
///     Ok(Response::new(StatusCode::OK).with_chunk("hello"))
/// };
///
/// let request = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
/// let response = Handler::call(&hello, &request).unwrap();
/// assert_eq!(response.body_bytes(), b"hello");
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: &Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, request: &Request) -> HandlerResult {
        self(request)
    }
}
