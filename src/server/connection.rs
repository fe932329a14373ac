//! # Conexión
//! src/server/connection.rs
//!
//! Una conexión aceptada: el stream más la dirección del cliente y el puerto
//! local. Tiene un único dueño a la vez (listener → despachador → worker) y
//! se cierra al soltarse, así que se cierra exactamente una vez en cualquier
//! camino de salida.

use std::io;
use std::net::{SocketAddr, TcpStream};

/// Conexión TCP aceptada, genérica sobre el tipo de stream
///
/// `S` es `std::net::TcpStream` para los despachadores bloqueantes y
/// `tokio::net::TcpStream` para el cooperativo.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    local_port: u16,
}

impl<S> Connection<S> {
    pub fn from_parts(stream: S, peer: SocketAddr, local_port: u16) -> Self {
        Self {
            stream,
            peer,
            local_port,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl Connection<TcpStream> {
    /// Envuelve un stream recién aceptado
    pub fn accept(stream: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        let local_port = stream.local_addr()?.port();
        Ok(Self::from_parts(stream, peer, local_port))
    }
}

impl Connection<tokio::net::TcpStream> {
    pub fn accept_async(stream: tokio::net::TcpStream, peer: SocketAddr) -> io::Result<Self> {
        let local_port = stream.local_addr()?.port();
        Ok(Self::from_parts(stream, peer, local_port))
    }
}
