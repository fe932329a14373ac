//! # App de Archivos (demo)
//! src/handler/files.rs
//!
//! Sirve archivos del disco usando el path del request tal cual:
//! `GET /test.txt` lee `<root>/test.txt`.
//!
//! - Archivo existente → `200`, `Content-Type: text/html`, body = bytes del archivo
//! - Cualquier otro caso → `404`, mismo content type, body vacío

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{Handler, HandlerResult};
use crate::http::{Request, Response, StatusCode};

/// Handler que mapea paths a archivos bajo un directorio raíz
#[derive(Debug, Clone)]
pub struct FileServingApp {
    root: PathBuf,
}

impl FileServingApp {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Traduce el path del request a un archivo bajo la raíz
    ///
    /// Retorna `None` si el path intenta salir de la raíz (`..`).
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }

        Some(self.root.join(relative))
    }

    fn not_found() -> Response {
        Response::new(StatusCode::NOT_FOUND)
            .with_header("Content-Type", "text/html")
            .with_chunk(Vec::new())
    }
}

impl Handler for FileServingApp {
    fn call(&self, request: &Request) -> HandlerResult {
        let path = match self.resolve(request.path()) {
            Some(path) if path.is_file() => path,
            _ => return Ok(Self::not_found()),
        };

        let body = fs::read(&path)?;
        tracing::debug!(path = %path.display(), bytes = body.len(), "serving file");

        Ok(Response::new(StatusCode::OK)
            .with_header("Content-Type", "text/html")
            .with_chunk(body))
    }
}
