//! # Apagado
//! src/server/shutdown.rs
//!
//! `accept` bloquea sin timeout, así que marcar la bandera no alcanza: hay
//! que despertar al loop con una conexión descartable. El loop revisa la
//! bandera después de cada `accept` y, si está marcada, suelta esa conexión
//! y termina.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle clonable para pedir el apagado desde otro thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            addr,
        }
    }

    /// Pide el apagado. Llamarlo más de una vez no tiene efecto extra.
    pub fn trigger(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!(addr = %self.addr, "shutdown requested");

        // Si el listener ya no existe el connect falla, y está bien
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr(), WAKE_TIMEOUT) {
            tracing::debug!(error = %e, "wake-up connection failed");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Dirección del listener que este handle despierta
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `0.0.0.0` y `::` no son destinos válidos; se usa loopback
    fn wake_addr(&self) -> SocketAddr {
        let ip = match self.addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        SocketAddr::new(ip, self.addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_trigger_sets_flag_and_wakes_accept() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let handle = ShutdownHandle::new(listener.local_addr().unwrap());
        assert!(!handle.is_triggered());

        let remote = handle.clone();
        let waker = std::thread::spawn(move || remote.trigger());

        // Sin el connect de trigger este accept bloquearía para siempre
        let (_stream, _peer) = listener.accept().unwrap();
        waker.join().unwrap();

        assert!(handle.is_triggered());
    }

    #[test]
    fn test_unspecified_address_wakes_loopback() {
        let handle = ShutdownHandle::new("0.0.0.0:8080".parse().unwrap());
        assert_eq!(handle.wake_addr(), "127.0.0.1:8080".parse().unwrap());

        let handle = ShutdownHandle::new("[::]:8080".parse().unwrap());
        assert_eq!(handle.wake_addr(), "[::1]:8080".parse().unwrap());
    }

    #[test]
    fn test_trigger_without_listener_is_harmless() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let handle = ShutdownHandle::new(SocketAddr::from(([127, 0, 0, 1], port)));
        handle.trigger();
        handle.trigger();
        assert!(handle.is_triggered());
    }
}
