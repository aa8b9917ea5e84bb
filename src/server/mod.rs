//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en `host:port`
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea el request HTTP
//! 4. Lo enruta a la API de descargas y envía la respuesta

pub mod tcp;

pub use tcp::{build_router, Server};
