//! # Respuestas HTTP
//!
//! Una respuesta es el triple que devuelve el handler: código de estado,
//! headers y body. El body es una secuencia ordenada de chunks de bytes; el
//! [`super::Responder`] suma sus largos para el `Content-Length` y los
//! escribe uno tras otro.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use dispatch_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::OK)
//!     .with_header("Content-Type", "text/plain")
//!     .with_chunk("ab")
//!     .with_chunk("cde");
//!
//! assert_eq!(response.content_length(), 5);
//! ```

use super::StatusCode;

/// Respuesta HTTP: estado, headers en orden de inserción y chunks del body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,

    /// Se conserva el orden en que el handler los agregó
    headers: Vec<(String, String)>,

    body: Vec<Vec<u8>>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Arma una respuesta a partir del triple (estado, headers, chunks)
    ///
    /// # Ejemplo
    /// ```
    /// use dispatch_server::http::Response;
    ///
    /// let response = Response::from_parts(
    ///     404u16,
    ///     vec![("Content-Type".to_string(), "text/html".to_string())],
    ///     vec![Vec::new()],
    /// );
    /// assert_eq!(response.status().as_u16(), 404);
    /// assert_eq!(response.content_length(), 0);
    /// ```
    pub fn from_parts(
        status: impl Into<StatusCode>,
        headers: Vec<(String, String)>,
        body: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            status: status.into(),
            headers,
            body,
        }
    }

    /// Agrega un header (builder)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente
    ///
    /// Si ya existe un header con el mismo nombre (sin importar mayúsculas),
    /// se reemplaza su valor.
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Agrega un chunk al final del body (builder)
    pub fn with_chunk(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.body.push(chunk.into());
        self
    }

    /// Agrega un chunk al final del body
    pub fn push_chunk(&mut self, chunk: impl Into<Vec<u8>>) {
        self.body.push(chunk.into());
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Busca un header sin importar mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.body
    }

    /// Suma de los largos de todos los chunks
    pub fn content_length(&self) -> usize {
        self.body.iter().map(Vec::len).sum()
    }

    /// Body completo concatenado (útil en tests)
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.concat()
    }
}
