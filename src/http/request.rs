//! # Requests HTTP
//! src/http/request.rs
//!
//! Representación inmutable de un request ya parseado. El parsing vive en
//! [`super::parser`]; aquí solo están los tipos y las vistas que consume el
//! handler.
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.1`
//! 2. **Headers**: Pares `Name: Value` (nombres normalizados a minúsculas)
//! 3. **Body**: Solo para POST y PUT, tamaño dado por `Content-Length`
//! 4. **Metadata**: dirección remota y URI absoluta reconstruida

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::net::SocketAddr;

use super::parser::{ParseError, RequestParser};

/// Métodos HTTP estándar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    CONNECT,
    TRACE,
}

impl Method {
    /// Parsea un método desde el token de la request line
    ///
    /// Retorna `None` si el token no es un verbo HTTP estándar.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "PATCH" => Some(Method::PATCH),
            "OPTIONS" => Some(Method::OPTIONS),
            "CONNECT" => Some(Method::CONNECT),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }

    /// Solo POST y PUT leen body
    pub fn reads_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Request target tal como llegó (ej: "/a/b?c=1")
    target: String,

    /// Path de la petición (ej: "/a/b")
    path: String,

    /// Query string sin el '?' (ej: "c=1"); `None` si no había '?'
    query: Option<String>,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Body, presente solo para POST y PUT
    body: Option<Vec<u8>>,

    /// Dirección del cliente
    remote_addr: SocketAddr,

    /// URI absoluta reconstruida (informativa)
    request_uri: String,
}

impl Request {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        method: Method,
        target: String,
        path: String,
        query: Option<String>,
        headers: HashMap<String, String>,
        body: Option<Vec<u8>>,
        remote_addr: SocketAddr,
        request_uri: String,
    ) -> Self {
        Self {
            method,
            target,
            path,
            query,
            headers,
            body,
            remote_addr,
            request_uri,
        }
    }

    /// Parsea un request completo desde bytes en memoria
    ///
    /// Atajo para tests y handlers: usa `127.0.0.1:0` como dirección remota
    /// y el puerto 80 como puerto local.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use dispatch_server::http::Request;
    ///
    /// let request = Request::parse(b"GET /a/b?c=1 HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(request.path(), "/a/b");
    /// assert_eq!(request.query(), Some("c=1"));
    /// ```
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let peer = SocketAddr::from(([127, 0, 0, 1], 0));
        RequestParser::parse_bytes(raw, peer, 80)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header sin importar mayúsculas/minúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body como stream de entrada (`None` si el método no lleva body)
    pub fn body_reader(&self) -> Option<Cursor<&[u8]>> {
        self.body.as_deref().map(Cursor::new)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// Vista estilo CGI/Rack del request
    ///
    /// Claves: `REQUEST_METHOD`, `PATH_INFO`, `QUERY_STRING`, `REMOTE_ADDR`,
    /// `REMOTE_HOST`, `REQUEST_URI` y un `HTTP_<NOMBRE>` por header, con el
    /// nombre en mayúsculas y `-` cambiado por `_` (`X-Token` → `HTTP_X_TOKEN`).
    pub fn env(&self) -> BTreeMap<String, String> {
        let remote = self.remote_addr.ip().to_string();
        let mut env = BTreeMap::new();

        env.insert("REQUEST_METHOD".to_string(), self.method.as_str().to_string());
        env.insert("PATH_INFO".to_string(), self.path.clone());
        env.insert(
            "QUERY_STRING".to_string(),
            self.query.clone().unwrap_or_default(),
        );
        env.insert("REMOTE_ADDR".to_string(), remote.clone());
        env.insert("REMOTE_HOST".to_string(), remote);
        env.insert("REQUEST_URI".to_string(), self.request_uri.clone());

        for (name, value) in &self.headers {
            let key = name.to_ascii_uppercase().replace('-', "_");
            env.insert(format!("HTTP_{}", key), value.clone());
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_method_tokens() {
        assert_eq!(Method::from_token("GET"), Some(Method::GET));
        assert_eq!(Method::from_token("PUT"), Some(Method::PUT));
        assert_eq!(Method::from_token("get"), None);
        assert_eq!(Method::from_token("BREW"), None);
        assert_eq!(Method::DELETE.as_str(), "DELETE");
    }

    #[test]
    fn test_reads_body() {
        assert!(Method::POST.reads_body());
        assert!(Method::PUT.reads_body());
        assert!(!Method::GET.reads_body());
        assert!(!Method::PATCH.reads_body());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = Request::parse(b"GET / HTTP/1.1\r\nX-Custom-Thing: yes\r\n\r\n").unwrap();

        assert_eq!(request.header("x-custom-thing"), Some("yes"));
        assert_eq!(request.header("X-CUSTOM-THING"), Some("yes"));
        assert!(request.headers().contains_key("x-custom-thing"));
    }

    #[test]
    fn test_env_view() {
        let request =
            Request::parse(b"GET /a/b?c=1 HTTP/1.1\r\nHost: example\r\nUser-Agent: test\r\n\r\n")
                .unwrap();
        let env = request.env();

        assert_eq!(env["REQUEST_METHOD"], "GET");
        assert_eq!(env["PATH_INFO"], "/a/b");
        assert_eq!(env["QUERY_STRING"], "c=1");
        assert_eq!(env["REMOTE_ADDR"], "127.0.0.1");
        assert_eq!(env["REMOTE_HOST"], "127.0.0.1");
        assert_eq!(env["HTTP_HOST"], "example");
        assert_eq!(env["HTTP_USER_AGENT"], "test");
        assert!(!env.contains_key("HTTP_USER-AGENT"));
        assert_eq!(env["REQUEST_URI"], "http://127.0.0.1/a/b?c=1");
    }

    #[test]
    fn test_env_header_keys_use_underscores() {
        let request = Request::parse(
            b"POST /items HTTP/1.1\r\nX-Token: abc\r\nX-Forwarded-For: 10.0.0.1\r\n\r\n",
        )
        .unwrap();
        let env = request.env();

        assert_eq!(env["HTTP_X_TOKEN"], "abc");
        assert_eq!(env["HTTP_X_FORWARDED_FOR"], "10.0.0.1");
        assert!(env.keys().all(|key| !key.contains('-')));
    }

    #[test]
    fn test_env_without_query() {
        let request = Request::parse(b"GET /plain HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.query(), None);
        assert_eq!(request.env()["QUERY_STRING"], "");
    }

    #[test]
    fn test_body_reader() {
        let request =
            Request::parse(b"PUT /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap();

        let mut text = String::new();
        request.body_reader().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");

        let get = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(get.body_reader().is_none());
    }
}
