//! # Download Server
//! src/lib.rs
//!
//! Servidor HTTP que descarga audio o video en segundo plano usando una
//! herramienta externa (por defecto `yt-dlp`). El cliente envía una URL,
//! recibe un ID de job, consulta su estado y, al completarse, descarga el
//! archivo.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP/1.x
//! - `server`: Servidor TCP y manejo de conexiones
//! - `router`: Enrutamiento de peticiones a handlers
//! - `jobs`: Registro, ejecución y supervisión de descargas
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Errores del motor de jobs
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use download_server::config::Config;
//! use download_server::server::Server;
//!
//! let server = Server::new(Config::default());
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod router;
pub mod server;

pub use error::JobError;
