//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints de la API de descargas:
//! - `POST /api/download`
//! - `GET /api/status/{id}`
//! - `GET /api/file/{id}`

use crate::error::JobError;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::JobManager;
use crate::jobs::types::MediaMode;
use crate::router::RouteParams;
use serde::Deserialize;

/// Body de `POST /api/download`
///
/// Acepta también los nombres `url` y `format`.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(alias = "url", default)]
    pub resource_locator: String,

    #[serde(alias = "format", default)]
    pub mode: Option<String>,
}

/// Handler para `POST /api/download`
///
/// # Ejemplo de response
/// ```json
/// {"job_id": "0b6c1e7e-7d4c-4d55-9a43-2f2b6a0b5d0e"}
/// ```
pub fn submit_handler(req: &Request, _params: &RouteParams, manager: &JobManager) -> Response {
    let body: SubmitRequest = match req.json_body() {
        Ok(body) => body,
        Err(e) => {
            return Response::error(StatusCode::BadRequest, &format!("Invalid JSON body: {}", e));
        }
    };

    let mode = match body.mode.as_deref() {
        None => MediaMode::default(),
        Some(raw) => match raw.parse::<MediaMode>() {
            Ok(mode) => mode,
            Err(e) => return error_response(&e),
        },
    };

    match manager.submit(&body.resource_locator, mode) {
        Ok(job_id) => Response::json(StatusCode::Ok, &serde_json::json!({ "job_id": job_id })),
        Err(e) => error_response(&e),
    }
}

/// Handler para `GET /api/status/{id}`
///
/// # Ejemplo de response
/// ```json
/// {"id": "...", "status": "failed", "error": "Download timed out (10 min limit)", "elapsed": 600.1, ...}
/// ```
pub fn status_handler(_req: &Request, params: &RouteParams, manager: &JobManager) -> Response {
    let job_id = params.get("id").map(String::as_str).unwrap_or_default();

    match manager.status(job_id) {
        Ok(record) => match serde_json::to_value(&record) {
            Ok(value) => Response::json(StatusCode::Ok, &value),
            Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
        },
        Err(JobError::NotFound(_)) => Response::error(StatusCode::NotFound, "Job not found"),
        Err(e) => error_response(&e),
    }
}

/// Handler para `GET /api/file/{id}`
///
/// Envía el archivo como adjunto; mientras el job no esté `completed`
/// responde 404.
pub fn file_handler(_req: &Request, params: &RouteParams, manager: &JobManager) -> Response {
    let job_id = params.get("id").map(String::as_str).unwrap_or_default();

    match manager.artifact(job_id) {
        Ok(handle) => Response::attachment(handle.file, handle.len, &handle.name),
        Err(JobError::NotFound(_)) | Err(JobError::NotReady { .. }) => {
            Response::error(StatusCode::NotFound, "File not ready")
        }
        Err(e) => {
            tracing::error!(job_id, error = %e, "could not open artifact");
            error_response(&e)
        }
    }
}

/// Traduce un `JobError` al código HTTP correspondiente
pub fn error_response(error: &JobError) -> Response {
    let status = match error {
        JobError::Usage(_) => StatusCode::BadRequest,
        JobError::NotFound(_) | JobError::NotReady { .. } => StatusCode::NotFound,
        _ => StatusCode::InternalServerError,
    };
    Response::error(status, &error.to_string())
}
