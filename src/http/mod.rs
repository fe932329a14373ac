//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP/1.1 que el servidor necesita, sin importar qué
//! despachador entregue la conexión:
//!
//! - Parsing del request directamente desde el socket (con límites)
//! - Representación de request y response
//! - Serialización de la respuesta al cable
//!
//! No hay keep-alive, chunked transfer-encoding ni pipelining: un request
//! por conexión y `Connection: close` en cada respuesta.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 12\r\n
//! Content-Type: application/json\r\n
//! Connection: close\r\n
//! \r\n
//! {"ok": true}
//! ```

pub mod parser;    // Lectura del request desde la conexión
pub mod request;   // Request inmutable y su vista CGI
pub mod responder; // Serialización al cable
pub mod response;  // Triple estado/headers/chunks
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use parser::{ParseError, RequestParser, MAX_HEADER_LENGTH, MAX_URI_LENGTH};
pub use request::{Method, Request};
pub use responder::Responder;
pub use response::Response;
pub use status::StatusCode;
