//! # Parser de Requests HTTP/1.1
//! src/http/parser.rs
//!
//! Lee un request directamente del stream de la conexión, línea por línea,
//! con límites de tamaño:
//!
//! - Request line: como máximo [`MAX_URI_LENGTH`] bytes (incluye el `\n`)
//! - Bloque de headers: como máximo [`MAX_HEADER_LENGTH`] bytes en total
//!
//! ```text
//! POST /some-path?query HTTP/1.1\r\n     <- request line
//! Content-Length: 5\r\n                  <- headers
//! \r\n                                   <- fin de headers
//! hello                                  <- body (solo POST/PUT)
//! ```
//!
//! La gramática es la misma para el driver bloqueante ([`RequestParser::parse`],
//! usado por el thread pool y los actores) y para el asíncrono
//! ([`RequestParser::parse_async`], usado por el despachador cooperativo);
//! solo cambia la forma de leer del socket.

use std::collections::HashMap;
use std::io::{self, BufRead, Read};
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use url::Url;

use super::request::{Method, Request};

/// Largo máximo de la request line (estándar de facto de los navegadores)
pub const MAX_URI_LENGTH: usize = 2083;

/// Largo máximo del bloque de headers (112 KiB)
pub const MAX_HEADER_LENGTH: usize = 112 * 1024;

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Error)]
pub enum ParseError {
    /// El cliente cerró sin mandar nada; se cierra sin ruido en los logs
    #[error("connection closed before the request line")]
    ConnectionClosed,

    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("request line exceeds 2083 bytes")]
    UriTooLong,

    #[error("header block exceeds 112 KiB")]
    HeaderTooLarge,

    #[error("i/o error while reading request: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Verdadero cuando el fallo no merece un log (el peer simplemente cerró)
    pub fn is_silent(&self) -> bool {
        matches!(self, ParseError::ConnectionClosed)
    }
}

/// Request line ya separada en sus partes
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestLine {
    method: Method,
    target: String,
    path: String,
    query: Option<String>,
}

/// Acumulador del bloque de headers con su presupuesto de bytes
struct HeaderBlock {
    headers: HashMap<String, String>,
    remaining: usize,
}

impl HeaderBlock {
    fn new() -> Self {
        Self {
            headers: HashMap::new(),
            remaining: MAX_HEADER_LENGTH,
        }
    }

    /// Cuántos bytes se pueden leer para la próxima línea
    fn budget(&self) -> Result<u64, ParseError> {
        if self.remaining == 0 {
            return Err(ParseError::HeaderTooLarge);
        }
        Ok(self.remaining as u64)
    }

    /// Procesa una línea leída; retorna `false` al llegar a la línea vacía
    fn push_line(&mut self, raw: &[u8]) -> Result<bool, ParseError> {
        // EOF antes de la línea vacía: se toma como fin de headers
        if raw.is_empty() {
            return Ok(false);
        }

        self.remaining -= raw.len();
        if !raw.ends_with(b"\n") && self.remaining == 0 {
            return Err(ParseError::HeaderTooLarge);
        }

        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return Ok(false);
        }

        match line.split_once(": ") {
            Some((name, value)) => {
                self.headers
                    .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
            None => {
                tracing::trace!(line = %line, "ignoring header line without separator");
            }
        }

        Ok(true)
    }

    /// Largo del body declarado; ausente o no numérico equivale a cero
    fn content_length(&self) -> u64 {
        self.headers
            .get("content-length")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }
}

/// Parser de requests HTTP/1.1
pub struct RequestParser;

impl RequestParser {
    /// Lee y parsea un request desde un stream bloqueante
    ///
    /// # Argumentos
    ///
    /// * `reader` - Lado de lectura de la conexión (con buffer)
    /// * `peer` - Dirección del cliente
    /// * `local_port` - Puerto en el que escucha el servidor
    pub fn parse<R: BufRead>(
        reader: &mut R,
        peer: SocketAddr,
        local_port: u16,
    ) -> Result<Request, ParseError> {
        let mut buf = Vec::new();

        reader
            .by_ref()
            .take(MAX_URI_LENGTH as u64)
            .read_until(b'\n', &mut buf)?;
        let line = Self::parse_request_line(&buf)?;

        let mut block = HeaderBlock::new();
        loop {
            buf.clear();
            let budget = block.budget()?;
            reader.by_ref().take(budget).read_until(b'\n', &mut buf)?;
            if !block.push_line(&buf)? {
                break;
            }
        }

        let body = if line.method.reads_body() {
            let expected = block.content_length();
            let mut body = Vec::new();
            reader.by_ref().take(expected).read_to_end(&mut body)?;
            Self::check_body_length(&body, expected)?;
            Some(body)
        } else {
            None
        };

        Ok(Self::assemble(line, block, body, peer, local_port))
    }

    /// Igual que [`RequestParser::parse`] pero cediendo el control al
    /// runtime en cada lectura
    pub async fn parse_async<R>(
        reader: &mut R,
        peer: SocketAddr,
        local_port: u16,
    ) -> Result<Request, ParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();

        AsyncReadExt::take(&mut *reader, MAX_URI_LENGTH as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        let line = Self::parse_request_line(&buf)?;

        let mut block = HeaderBlock::new();
        loop {
            buf.clear();
            let budget = block.budget()?;
            AsyncReadExt::take(&mut *reader, budget)
                .read_until(b'\n', &mut buf)
                .await?;
            if !block.push_line(&buf)? {
                break;
            }
        }

        let body = if line.method.reads_body() {
            let expected = block.content_length();
            let mut body = Vec::new();
            AsyncReadExt::take(&mut *reader, expected)
                .read_to_end(&mut body)
                .await?;
            Self::check_body_length(&body, expected)?;
            Some(body)
        } else {
            None
        };

        Ok(Self::assemble(line, block, body, peer, local_port))
    }

    /// Parsea un request que ya está completo en memoria
    pub fn parse_bytes(
        raw: &[u8],
        peer: SocketAddr,
        local_port: u16,
    ) -> Result<Request, ParseError> {
        let mut reader = raw;
        Self::parse(&mut reader, peer, local_port)
    }

    /// Valida y separa la request line
    ///
    /// Formato: `METHOD SP REQUEST-TARGET SP VERSION`; la versión se ignora.
    fn parse_request_line(raw: &[u8]) -> Result<RequestLine, ParseError> {
        if raw.is_empty() {
            return Err(ParseError::ConnectionClosed);
        }
        if !raw.ends_with(b"\n") && raw.len() >= MAX_URI_LENGTH {
            return Err(ParseError::UriTooLong);
        }

        let line = std::str::from_utf8(raw).map_err(|_| ParseError::MalformedRequestLine)?;
        let mut tokens = line.split_whitespace();

        let method = tokens
            .next()
            .and_then(Method::from_token)
            .ok_or(ParseError::MalformedRequestLine)?;
        let target = tokens.next().ok_or(ParseError::MalformedRequestLine)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };

        Ok(RequestLine {
            method,
            target: target.to_string(),
            path,
            query,
        })
    }

    fn check_body_length(body: &[u8], expected: u64) -> Result<(), ParseError> {
        if (body.len() as u64) < expected {
            return Err(ParseError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body truncated: got {} of {} bytes", body.len(), expected),
            )));
        }
        Ok(())
    }

    fn assemble(
        line: RequestLine,
        block: HeaderBlock,
        body: Option<Vec<u8>>,
        peer: SocketAddr,
        local_port: u16,
    ) -> Request {
        let request_uri = make_request_uri(&line.target, peer.ip(), local_port);
        Request::new(
            line.method,
            line.target,
            line.path,
            line.query,
            block.headers,
            body,
            peer,
            request_uri,
        )
    }
}

/// Reconstruye `http://<host>:<port><target>`
///
/// Es solo informativa: si el target no se puede unir a la base se arma la
/// cadena a mano.
pub fn make_request_uri(target: &str, host: IpAddr, port: u16) -> String {
    let authority = match host {
        IpAddr::V4(ip) => format!("{}:{}", ip, port),
        IpAddr::V6(ip) => format!("[{}]:{}", ip, port),
    };

    Url::parse(&format!("http://{}/", authority))
        .and_then(|base| base.join(target))
        .map(|uri| uri.to_string())
        .unwrap_or_else(|_| format!("http://{}{}", authority, target))
}
