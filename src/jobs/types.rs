//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define el registro de un job de descarga y su máquina de estados:
//!
//! ```text
//! starting ──▶ downloading ──▶ completed
//!     │              │
//!     └──────────────┴───────▶ failed
//! ```
//!
//! `completed` y `failed` son terminales: ninguna transición sale de ellos.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Estado de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Registro creado, el runner todavía no arrancó
    Starting,

    /// Proceso externo en ejecución
    Downloading,

    /// Terminó y se encontró el archivo
    Completed,

    /// Falló (código de salida, timeout, sin archivo o error inesperado)
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Verifica si el estado es terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Perfil de salida solicitado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Mejor audio disponible, recodificado a mp3
    #[default]
    Audio,

    /// Mejor video+audio, remuxeado a mp4
    Video,
}

/// Preferencias de formato para video, en orden de fallback
const VIDEO_FORMAT_PREFERENCES: [&str; 3] = [
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]",
    "best[ext=mp4]",
    "best",
];

impl MediaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaMode::Audio => "audio",
            MediaMode::Video => "video",
        }
    }

    /// Argumentos fijos de la herramienta externa para este perfil
    pub fn profile_args(&self) -> Vec<String> {
        match self {
            MediaMode::Audio => vec![
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                "0".into(),
            ],
            MediaMode::Video => vec![
                "-f".into(),
                VIDEO_FORMAT_PREFERENCES.join("/"),
                "--merge-output-format".into(),
                "mp4".into(),
            ],
        }
    }
}

impl FromStr for MediaMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "audio" => Ok(MediaMode::Audio),
            "video" => Ok(MediaMode::Video),
            other => Err(JobError::Usage(format!("Unknown mode: {}", other))),
        }
    }
}

/// Milisegundos desde UNIX epoch
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Registro de un job
///
/// Solo el runner asignado al job lo muta, y siempre a través de las
/// transiciones `mark_*` aplicadas bajo el lock del `JobStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// ID único del job (UUID v4)
    pub id: String,

    /// URL remota pedida por el cliente
    pub resource_locator: String,

    /// Perfil de salida
    pub mode: MediaMode,

    /// Estado actual
    pub status: JobStatus,

    /// Mensaje de error (solo si `failed`)
    pub error: Option<String>,

    /// Nombre sugerido del archivo (solo si `completed`)
    pub artifact_name: Option<String>,

    /// Ruta del archivo en disco (solo si `completed`)
    pub artifact_path: Option<String>,

    /// Timestamp de creación (ms desde epoch)
    pub started_at: u64,

    /// Timestamp de la transición terminal (ms desde epoch)
    pub finished_at: Option<u64>,

    /// Duración en segundos, redondeada a un decimal
    pub elapsed: Option<f64>,
}

impl JobRecord {
    /// Crea un registro nuevo en estado `starting`
    pub fn new(id: String, resource_locator: String, mode: MediaMode) -> Self {
        Self {
            id,
            resource_locator,
            mode,
            status: JobStatus::Starting,
            error: None,
            artifact_name: None,
            artifact_path: None,
            started_at: now_millis(),
            finished_at: None,
            elapsed: None,
        }
    }

    /// Verifica si el job está en estado terminal
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `starting` → `downloading`
    pub fn mark_downloading(&mut self) -> Result<(), JobError> {
        self.check_transition(JobStatus::Downloading, &[JobStatus::Starting])?;
        self.status = JobStatus::Downloading;
        Ok(())
    }

    /// `downloading` → `completed`
    pub fn mark_completed(&mut self, name: String, path: String) -> Result<(), JobError> {
        self.check_transition(JobStatus::Completed, &[JobStatus::Downloading])?;
        self.status = JobStatus::Completed;
        self.error = None;
        self.artifact_name = Some(name);
        self.artifact_path = Some(path);
        self.stamp_finish();
        Ok(())
    }

    /// Cualquier estado no terminal → `failed`
    pub fn mark_failed(&mut self, error: String) -> Result<(), JobError> {
        self.check_transition(
            JobStatus::Failed,
            &[JobStatus::Starting, JobStatus::Downloading],
        )?;
        self.status = JobStatus::Failed;
        self.error = Some(error);
        self.artifact_name = None;
        self.artifact_path = None;
        self.stamp_finish();
        Ok(())
    }

    fn check_transition(&self, to: JobStatus, allowed_from: &[JobStatus]) -> Result<(), JobError> {
        if allowed_from.contains(&self.status) {
            Ok(())
        } else {
            Err(JobError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    // elapsed se fija una sola vez
    fn stamp_finish(&mut self) {
        if self.elapsed.is_some() {
            return;
        }
        let now = now_millis();
        let millis = now.saturating_sub(self.started_at);
        self.finished_at = Some(now);
        self.elapsed = Some((millis as f64 / 100.0).round() / 10.0);
    }
}
