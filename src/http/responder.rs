//! # Serialización de Respuestas
//! src/http/responder.rs
//!
//! Escribe una [`Response`] en la conexión con este orden fijo:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n            <- status line
//! Content-Length: 5\r\n          <- calculado (suma de los chunks)
//! Content-Type: text/plain\r\n   <- headers del handler
//! Connection: close\r\n          <- fijo, no hay keep-alive
//! \r\n
//! abcde                          <- chunks en orden
//! ```
//!
//! `Content-Length` y `Connection` los pone siempre el servidor; si el
//! handler trae alguno de los dos, se descarta para que el framing no se
//! contradiga. No hay recuperación de escrituras parciales: el primer error
//! aborta la respuesta.

use std::io::{self, Write};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::Response;

/// Headers que controla el servidor
const RESERVED_HEADERS: [&str; 2] = ["content-length", "connection"];

/// Serializador de respuestas HTTP/1.1
pub struct Responder;

impl Responder {
    /// Construye la cabecera completa (status line, headers y línea vacía)
    ///
    /// El `Content-Length` se calcula antes de enviar cualquier byte.
    ///
    /// # Ejemplo
    /// ```
    /// use dispatch_server::http::{Responder, Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::OK).with_chunk("ab").with_chunk("cde");
    /// let head = String::from_utf8(Responder::head(&response)).unwrap();
    ///
    /// assert_eq!(head, "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\n");
    /// ```
    pub fn head(response: &Response) -> Vec<u8> {
        let mut head = Vec::with_capacity(128);

        head.extend_from_slice(format!("HTTP/1.1 {}\r\n", response.status()).as_bytes());
        head.extend_from_slice(
            format!("Content-Length: {}\r\n", response.content_length()).as_bytes(),
        );

        for (name, value) in response.headers() {
            if RESERVED_HEADERS
                .iter()
                .any(|reserved| name.eq_ignore_ascii_case(reserved))
            {
                tracing::debug!(header = %name, "dropping handler-supplied framing header");
                continue;
            }
            head.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        head.extend_from_slice(b"Connection: close\r\n");
        head.extend_from_slice(b"\r\n");
        head
    }

    /// Escribe la respuesta en un stream bloqueante
    pub fn respond<W: Write>(conn: &mut W, response: &Response) -> io::Result<()> {
        conn.write_all(&Self::head(response))?;
        for chunk in response.chunks() {
            conn.write_all(chunk)?;
        }
        conn.flush()
    }

    /// Escribe la respuesta en un stream asíncrono
    pub async fn respond_async<W>(conn: &mut W, response: &Response) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        conn.write_all(&Self::head(response)).await?;
        for chunk in response.chunks() {
            conn.write_all(chunk).await?;
        }
        conn.flush().await
    }

    /// Serializa la respuesta completa en memoria
    pub fn to_bytes(response: &Response) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(128 + response.content_length());
        // Escribir en un Vec no puede fallar
        let _ = Self::respond(&mut bytes, response);
        bytes
    }
}
