//! # Errores del Servidor
//! src/error.rs
//!
//! Solo `Bind`, `Runtime` y `Config` detienen el arranque. El resto son
//! fallas de una conexión: se registran, la conexión se cierra y nada más
//! se entera (ni el listener ni los otros workers).

use std::io;

use thiserror::Error;

use crate::handler::HandlerError;
use crate::http::ParseError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha (fatal)
    #[error("cannot listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Falló un `accept`; el loop sigue
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("bad request: {0}")]
    Parse(#[from] ParseError),

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// No se pudieron levantar los workers o el runtime del despachador
    #[error("cannot start dispatcher: {0}")]
    Runtime(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ServerError {
    /// Fallas que se cierran sin dejar rastro en los logs
    pub fn is_silent(&self) -> bool {
        matches!(self, ServerError::Parse(err) if err.is_silent())
    }
}
