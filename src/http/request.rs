//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser mínimo de HTTP/1.0 y HTTP/1.1 para la API de descargas.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /api/download HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 47\r\n
//! \r\n
//! {"url": "https://example.com/v", "format": "audio"}
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.x`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes crudos (JSON en `POST /api/download`)

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    HEAD,
    POST,
}

impl Method {
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path decodificado, sin query string (ej: "/api/status/abc")
    path: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    version: String,

    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Empty request")]
    EmptyRequest,
}

/// Posición del separador `\r\n\r\n` entre headers y body
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

impl Request {
    /// Parsea un request desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use download_server::http::Request;
    ///
    /// let raw = b"GET /api/status/abc HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/api/status/abc");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let (head, body) = match find_header_end(buffer) {
            Some(pos) => (&buffer[..pos], &buffer[pos + 4..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            version,
            body: body.to_vec(),
        })
    }

    /// Formato: `GET /path?query HTTP/1.x`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let raw_path = parts[1].split('?').next().unwrap_or("");
        if !raw_path.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }
        let path = percent_decode_str(raw_path).decode_utf8_lossy().into_owned();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Valor de `Content-Length`, si viene y es válido
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Deserializa el body como JSON
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_strips_query() {
        let raw = b"GET /api/status/abc?cache=no HTTP/1.1\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/api/status/abc");
        assert_eq!(request.version(), "HTTP/1.1");
    }

    #[test]
    fn test_parse_percent_decodes_path() {
        let raw = b"GET /api/file/a%20b HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.path(), "/api/file/a b");
    }

    #[test]
    fn test_parse_headers_case_insensitive() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8080\r\ncontent-length: 0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("host"), Some("localhost:8080"));
        assert_eq!(request.header("Content-Length"), Some("0"));
        assert_eq!(request.content_length(), Some(0));
    }

    #[test]
    fn test_parse_post_json_body() {
        #[derive(Deserialize)]
        struct Body {
            url: String,
        }

        let raw = b"POST /api/download HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 23\r\n\r\n{\"url\": \"http://x/y\"}\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        let body: Body = request.json_body().unwrap();
        assert_eq!(body.url, "http://x/y");
    }

    #[test]
    fn test_unsupported_method() {
        let raw = b"DELETE / HTTP/1.0\r\n\r\n";
        let result = Request::parse(raw);

        assert!(matches!(result, Err(ParseError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_invalid_version() {
        let raw = b"GET / HTTP/2.0\r\n\r\n";
        let result = Request::parse(raw);

        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_invalid_header() {
        let raw = b"GET / HTTP/1.0\r\nno-colon-here\r\n\r\n";
        let result = Request::parse(raw);

        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_empty_request() {
        let result = Request::parse(b"");
        assert!(matches!(result, Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
    }

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"GET / HTTP/1.0\r\n\r\nbody"), Some(14));
        assert_eq!(find_header_end(b"GET / HTTP/1.0\r\n"), None);
    }
}
