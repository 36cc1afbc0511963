//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! - `tcp`: listener/acceptor, numera conexiones y las pasa al pool
//! - `pool`: threads fijos + cola acotada de conexiones aceptadas
//! - `worker`: máquina de estados de una conexión (leer → responder → cerrar)

pub mod pool;
pub mod tcp;
pub mod worker;

// Re-exportar para facilitar el uso
pub use pool::WorkerPool;
pub use tcp::Server;
pub use worker::{handle_connection, ConnectionContext, Limits, Stage};
