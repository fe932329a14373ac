//! # Dispatch Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 mínimo cuyo tema real es cómo se despacha cada
//! conexión aceptada al trabajo que la atiende. El protocolo es el mismo
//! para las tres estrategias; solo cambia quién y dónde corre el pipeline.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: parser de requests, responses y su serialización
//! - `handler`: contrato `Request -> Response` y la app de archivos de demo
//! - `server`: listener, conexión, pipeline por conexión y apagado
//! - `dispatch`: pool de threads, despachador cooperativo y cola de actores
//! - `config`: configuración por CLI y variables de entorno
//! - `metrics`: contadores por resultado de conexión
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use std::sync::Arc;
//! use dispatch_server::config::{Config, Mode};
//! use dispatch_server::handler::FileServingApp;
//! use dispatch_server::server::Server;
//!
//! let config = Config { mode: Mode::Actor, ..Config::default() };
//! let app = Arc::new(FileServingApp::new("./public"));
//!
//! let server = Server::bind(&config, app)?;
//! server.run()?;
//! # Ok::<(), dispatch_server::error::ServerError>(())
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod metrics;
pub mod server;
