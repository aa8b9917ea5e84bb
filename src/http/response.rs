//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para armar respuestas y escribirlas en el socket. El body puede ser
//! un buffer en memoria (JSON) o un archivo abierto, que se copia al
//! socket por bloques sin cargarlo entero en memoria.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use download_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"job_id": "abc"}"#);
//!
//! let mut out = Vec::new();
//! response.write_to(&mut out).unwrap();
//! ```

use super::StatusCode;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};

/// Contenido de la respuesta
#[derive(Debug)]
pub enum Body {
    Bytes(Vec<u8>),
    File(File),
}

/// Respuesta HTTP completa
#[derive(Debug)]
pub struct Response {
    status: StatusCode,

    /// Headers (sin duplicados)
    headers: HashMap<String, String>,

    body: Body,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Bytes(Vec::new()),
        }
    }

    /// Agrega un header (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Body desde un string; calcula `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Body desde bytes; calcula `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.add_header("Content-Length", &body.len().to_string());
        self.body = Body::Bytes(body);
        self
    }

    /// Respuesta JSON con el status indicado
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&value.to_string())
    }

    /// Respuesta de error: `{"error": "mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use download_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Job not found");
    /// assert_eq!(response.status(), StatusCode::NotFound);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// Descarga de un archivo como adjunto
    ///
    /// El nombre va dos veces en `Content-Disposition`: en ASCII para
    /// clientes viejos y codificado (RFC 5987) para preservar UTF-8.
    pub fn attachment(file: File, len: u64, filename: &str) -> Self {
        let ascii_name: String = filename
            .chars()
            .map(|c| {
                if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let encoded_name = utf8_percent_encode(filename, NON_ALPHANUMERIC);
        let disposition = format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii_name, encoded_name
        );

        let mut response = Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/octet-stream")
            .with_header("Content-Disposition", &disposition)
            .with_header("Content-Length", &len.to_string());
        response.body = Body::File(file);
        response
    }

    /// Status line y headers, terminados en la línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.0 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Escribe la respuesta completa
    pub fn write_to<W: Write>(self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.head_bytes())?;
        match self.body {
            Body::Bytes(bytes) => out.write_all(&bytes)?,
            Body::File(mut file) => {
                io::copy(&mut file, out)?;
            }
        }
        out.flush()
    }

    /// Escribe solo los headers (respuesta a `HEAD`)
    pub fn write_head_to<W: Write>(self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.head_bytes())?;
        out.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Body en memoria (`None` si es un archivo)
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            Body::File(_) => None,
        }
    }
}
