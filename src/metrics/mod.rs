//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Contadores por resultado de conexión (respondida, cerrada en silencio,
//! error de parseo/handler/escritura), conexiones activas y latencias.

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot, Outcome};
