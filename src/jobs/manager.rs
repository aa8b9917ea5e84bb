//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Punto de entrada único para crear trabajo nuevo y para consultarlo:
//!
//! - `submit`: valida, crea el registro y lanza un thread por job sin
//!   esperarlo (fire-and-forget)
//! - `status`: copia consistente del registro
//! - `artifact`: abre el archivo de un job `completed`
//!
//! No hay cola ni límite de jobs concurrentes: cada job arranca en cuanto
//! se envía.

use crate::error::JobError;
use crate::jobs::runner::{RunnerConfig, TaskRunner};
use crate::jobs::storage::JobStore;
use crate::jobs::types::{JobRecord, JobStatus, MediaMode};
use std::any::Any;
use std::fs::File;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;
use uuid::Uuid;

/// Archivo listo para enviar al cliente
#[derive(Debug)]
pub struct ArtifactHandle {
    /// Nombre sugerido para el cliente
    pub name: String,

    /// Ruta en disco
    pub path: PathBuf,

    /// Archivo abierto para lectura
    pub file: File,

    /// Tamaño en bytes
    pub len: u64,
}

/// Gestor central de jobs
#[derive(Clone)]
pub struct JobManager {
    store: JobStore,
    runner: TaskRunner,
}

impl JobManager {
    /// Crea un gestor con un store propio
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_store(JobStore::new(), config)
    }

    /// Crea un gestor sobre un store existente
    pub fn with_store(store: JobStore, config: RunnerConfig) -> Self {
        let runner = TaskRunner::new(config, store.clone());
        Self { store, runner }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Envía un job nuevo y retorna su ID sin esperar la ejecución
    pub fn submit(&self, resource_locator: &str, mode: MediaMode) -> Result<String, JobError> {
        let resource_locator = resource_locator.trim();
        if resource_locator.is_empty() {
            return Err(JobError::Usage("No URL provided".to_string()));
        }

        let job_id = Uuid::new_v4().to_string();
        self.store.create(JobRecord::new(
            job_id.clone(),
            resource_locator.to_string(),
            mode,
        ))?;

        tracing::info!(job_id = %job_id, url = resource_locator, mode = mode.as_str(), "job submitted");

        let runner = self.runner.clone();
        let store = self.store.clone();
        let id = job_id.clone();
        let url = resource_locator.to_string();

        let spawned = thread::Builder::new()
            .name(format!("job-{}", &job_id[..8]))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| runner.run(&id, &url, mode)));
                if let Err(payload) = outcome {
                    record_panic(&store, &id, payload.as_ref());
                }
            });

        // Sin thread el job no puede avanzar: se marca fallido y el
        // cliente se entera al consultar el estado.
        if let Err(err) = spawned {
            record_spawn_failure(&self.store, &job_id, &err);
        }

        Ok(job_id)
    }

    /// Obtiene el estado actual de un job
    pub fn status(&self, job_id: &str) -> Result<JobRecord, JobError> {
        self.store.get(job_id)
    }

    /// Abre el archivo de un job completado
    ///
    /// No mueve ni borra el archivo: se puede pedir cuantas veces se quiera.
    pub fn artifact(&self, job_id: &str) -> Result<ArtifactHandle, JobError> {
        let record = self.store.get(job_id)?;

        let (name, path) = match (record.status, record.artifact_name, record.artifact_path) {
            (JobStatus::Completed, Some(name), Some(path)) => (name, PathBuf::from(path)),
            (status, _, _) => {
                return Err(JobError::NotReady {
                    id: job_id.to_string(),
                    status,
                })
            }
        };

        let file = File::open(&path)?;
        let len = file.metadata()?.len();

        Ok(ArtifactHandle {
            name,
            path,
            file,
            len,
        })
    }
}

fn record_panic(store: &JobStore, job_id: &str, payload: &(dyn Any + Send)) {
    let message = format!("Worker panicked: {}", panic_message(payload));
    tracing::error!(job_id, error = %message, "job worker panicked");
    if let Err(err) = store.transition(job_id, |job| job.mark_failed(message)) {
        tracing::error!(job_id, error = %err, "could not record job outcome");
    }
}

fn record_spawn_failure(store: &JobStore, job_id: &str, err: &io::Error) {
    tracing::error!(job_id, error = %err, "could not spawn job worker");
    let message = format!("Could not start worker: {}", err);
    if let Err(err) = store.transition(job_id, |job| job.mark_failed(message)) {
        tracing::error!(job_id, error = %err, "could not record job outcome");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
