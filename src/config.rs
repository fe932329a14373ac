//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor con soporte para
//! argumentos CLI y variables de entorno. Solo `main` parsea la línea de
//! comandos; la librería recibe un `Config` ya armado.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./dispatch_server --port 8080 --mode actor --workers 8 --root ./public
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! PORT=8080 HOST=0.0.0.0 DISPATCH_MODE=cooperative ./dispatch_server
//! ```

use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Estrategia de despacho, elegida al arrancar
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Pool de threads con cola FIFO compartida
    Threads,
    /// Un thread, una tarea asíncrona por conexión
    Cooperative,
    /// Workers aislados que piden trabajo a una cola por mensajes
    Actor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Threads => "threads",
            Mode::Cooperative => "cooperative",
            Mode::Actor => "actor",
        };
        f.write_str(name)
    }
}

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "dispatch_server")]
#[command(about = "Servidor HTTP/1.1 mínimo con tres estrategias de despacho")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// Backlog de `listen`
    #[arg(long, default_value = "12", env = "TCP_BACKLOG")]
    pub backlog: u32,

    // === Despacho ===

    /// Tamaño del pool o cantidad de workers actor
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Estrategia de despacho
    #[arg(short, long, value_enum, default_value = "threads", env = "DISPATCH_MODE")]
    pub mode: Mode,

    /// Máximo de conexiones en vuelo en modo cooperativo (0 = sin límite)
    #[arg(long = "max-in-flight", default_value = "0", env = "MAX_IN_FLIGHT")]
    pub max_in_flight: usize,

    /// Timeout de lectura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "0", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Aplicación ===

    /// Directorio que sirve la aplicación de archivos
    #[arg(long, default_value = ".", env = "ROOT_DIR")]
    pub root: String,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use dispatch_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:3000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.backlog == 0 {
            return Err("Backlog must be >= 1".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        tracing::info!(address = %self.address(), backlog = self.backlog, "network");
        match self.mode {
            Mode::Cooperative if self.max_in_flight > 0 => {
                tracing::info!(mode = %self.mode, max_in_flight = self.max_in_flight, "dispatch")
            }
            Mode::Cooperative => tracing::info!(mode = %self.mode, "dispatch (unbounded)"),
            _ => tracing::info!(mode = %self.mode, workers = self.workers, "dispatch"),
        }
        match self.read_timeout() {
            Some(timeout) => tracing::info!(?timeout, "read timeout"),
            None => tracing::info!("read timeout disabled"),
        }
        tracing::info!(root = %self.root, "serving files");
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            backlog: 12,
            workers: 4,
            mode: Mode::Threads,
            max_in_flight: 0,
            read_timeout_ms: 0,
            root: ".".to_string(),
        }
    }
}
