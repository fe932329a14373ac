//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Cuenta qué pasó con cada conexión, sin importar qué despachador la
//! atendió. Se comparte entre workers con `Arc`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Cómo terminó el pipeline de una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Respuesta escrita completa
    Responded { status: u16 },
    /// El peer cerró sin mandar nada
    ClosedSilently,
    ParseFailed,
    HandlerFailed,
    WriteFailed,
}

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
struct MetricsData {
    accepted: u64,
    active_connections: u64,
    status_codes: BTreeMap<u16, u64>,
    closed_silently: u64,
    parse_failures: u64,
    handler_failures: u64,
    write_failures: u64,

    /// Latencias registradas (en microsegundos)
    latencies: VecDeque<u64>,

    /// Máximo de latencias a guardar (para calcular percentiles)
    max_latencies: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                accepted: 0,
                active_connections: 0,
                status_codes: BTreeMap::new(),
                closed_silently: 0,
                parse_failures: 0,
                handler_failures: 0,
                write_failures: 0,
                latencies: VecDeque::with_capacity(1024),
                max_latencies: 10_000,
            })),
            start_time: Instant::now(),
        }
    }

    /// Un worker que entra en pánico no debe dejar las métricas inutilizables
    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registra una conexión aceptada que empieza a procesarse
    pub fn connection_opened(&self) {
        let mut data = self.data();
        data.accepted += 1;
        data.active_connections += 1;
    }

    /// Registra el final del pipeline de una conexión
    pub fn connection_closed(&self, outcome: Outcome, latency: Duration) {
        let mut data = self.data();
        data.active_connections = data.active_connections.saturating_sub(1);

        match outcome {
            Outcome::Responded { status } => {
                *data.status_codes.entry(status).or_insert(0) += 1;
            }
            Outcome::ClosedSilently => data.closed_silently += 1,
            Outcome::ParseFailed => data.parse_failures += 1,
            Outcome::HandlerFailed => data.handler_failures += 1,
            Outcome::WriteFailed => data.write_failures += 1,
        }

        // Si tenemos demasiadas latencias, eliminar las más antiguas
        if data.latencies.len() >= data.max_latencies {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    pub fn active_connections(&self) -> u64 {
        self.data().active_connections
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let (p50, p99) = calculate_percentiles(&data.latencies);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: data.accepted,
            active_connections: data.active_connections,
            responded: data.status_codes.values().sum(),
            status_codes: data.status_codes.clone(),
            closed_silently: data.closed_silently,
            parse_failures: data.parse_failures,
            handler_failures: data.handler_failures,
            write_failures: data.write_failures,
            latency_p50_us: p50,
            latency_p99_us: p99,
        }
    }

    /// Snapshot serializado como JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Calcula p50 y p99 de una ventana de latencias
fn calculate_percentiles(latencies: &VecDeque<u64>) -> (u64, u64) {
    if latencies.is_empty() {
        return (0, 0);
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    (sorted[len * 50 / 100], sorted[len * 99 / 100])
}

/// Snapshot de métricas (para logs y tests)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub active_connections: u64,
    pub responded: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub closed_silently: u64,
    pub parse_failures: u64,
    pub handler_failures: u64,
    pub write_failures: u64,
    pub latency_p50_us: u64,
    pub latency_p99_us: u64,
}
