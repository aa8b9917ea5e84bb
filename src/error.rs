//! # Errores del Motor de Jobs
//! src/error.rs
//!
//! Taxonomía de errores del sistema de descargas. Los errores de uso
//! (`Usage`, `NotFound`, `NotReady`) se devuelven de forma síncrona a quien
//! llama; el resto los produce el runner y terminan guardados en el campo
//! `error` del job, nunca propagados al hilo que lo despachó.

use crate::jobs::types::JobStatus;
use std::time::Duration;

/// Errores del motor de jobs
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Entrada inválida al enviar un job (no se crea registro)
    #[error("{0}")]
    Usage(String),

    /// ID de job desconocido
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Ya existe un registro con ese ID
    #[error("Job already exists: {0}")]
    Duplicate(String),

    /// Se pidió el archivo antes de que el job terminara bien
    #[error("File not ready for job {id} (status: {status})")]
    NotReady { id: String, status: JobStatus },

    /// Transición no permitida por la máquina de estados
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// El proceso externo terminó con código distinto de cero
    #[error("{0}")]
    Execution(String),

    /// El proceso externo excedió el tiempo máximo
    #[error("Download timed out ({} limit)", format_limit(.0))]
    Timeout(Duration),

    /// El proceso terminó bien pero no dejó ningún archivo
    #[error("No file was downloaded")]
    OutputMissing,

    /// Falla de I/O inesperada (herramienta inexistente, disco, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formatea el límite de tiempo como "10 min" o "30 s"
fn format_limit(limit: &Duration) -> String {
    let secs = limit.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else if secs > 0 {
        format!("{} s", secs)
    } else {
        format!("{} ms", limit.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_in_minutes() {
        let err = JobError::Timeout(Duration::from_secs(600));
        assert_eq!(err.to_string(), "Download timed out (10 min limit)");
    }

    #[test]
    fn test_timeout_message_sub_second() {
        let err = JobError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Download timed out (250 ms limit)");
    }

    #[test]
    fn test_not_ready_mentions_status() {
        let err = JobError::NotReady {
            id: "abc".to_string(),
            status: JobStatus::Downloading,
        };
        assert!(err.to_string().contains("downloading"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "yt-dlp missing");
        let err: JobError = io.into();
        assert!(matches!(err, JobError::Io(_)));
        assert!(err.to_string().contains("yt-dlp missing"));
    }
}
