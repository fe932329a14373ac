//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Todo lo que rodea a una conexión, sin importar qué despachador la
//! atiende:
//! 1. Escucha en un puerto (`listener`)
//! 2. Acepta conexiones entrantes (`connection`)
//! 3. Parsea, llama al handler, responde y cierra (`pipeline`)
//! 4. Se apaga a pedido (`shutdown`)

pub mod connection;
pub mod listener;
pub mod pipeline;
pub mod shutdown;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::Connection;
pub use listener::Listener;
pub use pipeline::Pipeline;
pub use shutdown::ShutdownHandle;
pub use tcp::Server;
