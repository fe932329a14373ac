//! # Listener TCP
//! src/server/listener.rs
//!
//! Dueño del socket de escucha. Se hace `bind` + `listen` una sola vez al
//! arrancar; un error ahí es fatal. `accept` bloquea sin timeout.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};

use super::connection::Connection;
use crate::error::ServerError;

/// Socket de escucha del servidor
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Abre el socket con el backlog pedido
    ///
    /// Prueba cada dirección a la que resuelva `host` y se queda con la
    /// primera que acepte `bind` y `listen`.
    pub fn bind(host: &str, port: u16, backlog: u32) -> Result<Self, ServerError> {
        let address = format!("{}:{}", host, port);
        let bind_error = |source: io::Error| ServerError::Bind {
            address: address.clone(),
            source,
        };

        let candidates: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(bind_error)?
            .collect();

        let mut last_err = None;
        for addr in candidates {
            match Self::listen_on(addr, backlog) {
                Ok(inner) => {
                    let local_addr = inner.local_addr().map_err(bind_error)?;
                    tracing::debug!(%local_addr, backlog, "listening");
                    return Ok(Self { inner, local_addr });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(bind_error(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no socket addresses found")
        })))
    }

    fn listen_on(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

        Ok(socket.into())
    }

    /// Bloquea hasta que un cliente se conecte
    pub fn accept(&self) -> Result<Connection<TcpStream>, ServerError> {
        let (stream, peer) = self.inner.accept().map_err(ServerError::Accept)?;
        Connection::accept(stream, peer).map_err(ServerError::Accept)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Socket subyacente (el despachador cooperativo lo registra en tokio)
    pub fn into_std(self) -> TcpListener {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = Listener::bind("127.0.0.1", 0, 12).unwrap();
        assert_ne!(listener.local_addr().port(), 0);
        assert!(listener.local_addr().ip().is_loopback());
    }

    #[test]
    fn test_bind_error_is_fatal_variant() {
        let taken = Listener::bind("127.0.0.1", 0, 12).unwrap();
        let port = taken.local_addr().port();

        // Mismo puerto sin SO_REUSEPORT: el segundo bind falla
        let result = Listener::bind("127.0.0.1", port, 12);
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_accept_yields_connection() {
        let listener = Listener::bind("127.0.0.1", 0, 12).unwrap();
        let mut client = TcpStream::connect(listener.local_addr()).unwrap();
        client.write_all(b"ping").unwrap();

        let conn = listener.accept().unwrap();
        assert_eq!(conn.local_port(), listener.local_addr().port());
        assert_eq!(conn.peer(), client.local_addr().unwrap());
    }
}
