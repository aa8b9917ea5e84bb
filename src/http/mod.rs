//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima de HTTP/1.0 sobre `std::net`, suficiente para la
//! API de descargas:
//!
//! - Parsing de requests (request line, headers y body con `Content-Length`)
//! - Construcción de responses JSON y de descargas de archivos
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra (`Connection: close`).
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 48\r\n
//! \r\n
//! {"job_id":"0b6c1e7e-7d4c-4d55-9a43-2f2b6a0b5d0e"}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{find_header_end, Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
