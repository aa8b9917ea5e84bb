//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos que usa la API de descargas:
//!
//! - **2xx**: 200 (job creado, estado, archivo)
//! - **4xx**: 400 (URL vacía o body inválido), 404 (job desconocido o
//!   archivo no listo), 405 (método equivocado)
//! - **5xx**: 500 (falla al abrir el archivo)

/// Códigos de estado que soporta el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Parámetros inválidos o malformados
    BadRequest = 400,

    /// 404 Not Found - Ruta, job o archivo no disponible
    NotFound = 404,

    /// 405 Method Not Allowed - La ruta existe pero no con ese método
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - Headers o body exceden el límite
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use download_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Texto de razón asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
