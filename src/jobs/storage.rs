//! # Almacén de Jobs en Memoria
//! src/jobs/storage.rs
//!
//! Única fuente de verdad del estado de los jobs. Lo consultan tanto el
//! runner (que escribe) como las consultas de estado (que leen). Todas las
//! operaciones pasan por un único lock global, así que cada lectura ve un
//! registro completo y nunca una combinación intermedia de campos.
//!
//! No hay persistencia: los registros viven lo que vive el proceso.

use crate::error::JobError;
use crate::jobs::types::JobRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mapa concurrente `id -> JobRecord`
///
/// Clonar el store es barato y todos los clones comparten el mismo mapa.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<String, JobRecord>>>,
}

impl JobStore {
    /// Crea un store vacío
    pub fn new() -> Self {
        Self::default()
    }

    // Las mutaciones se aplican completas bajo el lock, un lock envenenado
    // sigue conteniendo registros consistentes.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserta un registro nuevo
    ///
    /// Falla con `Duplicate` si el ID ya existe; nunca sobrescribe.
    pub fn create(&self, record: JobRecord) -> Result<(), JobError> {
        let mut jobs = self.lock();
        if jobs.contains_key(&record.id) {
            return Err(JobError::Duplicate(record.id));
        }
        jobs.insert(record.id.clone(), record);
        Ok(())
    }

    /// Obtiene una copia del registro actual
    pub fn get(&self, job_id: &str) -> Result<JobRecord, JobError> {
        self.lock()
            .get(job_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Aplica `mutator` al registro con acceso exclusivo
    pub fn update<F, T>(&self, job_id: &str, mutator: F) -> Result<T, JobError>
    where
        F: FnOnce(&mut JobRecord) -> T,
    {
        let mut jobs = self.lock();
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        Ok(mutator(record))
    }

    /// Igual que `update` para transiciones que pueden fallar
    pub fn transition<F>(&self, job_id: &str, transition: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut JobRecord) -> Result<(), JobError>,
    {
        self.update(job_id, transition)?
    }

    /// Número de jobs almacenados
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// IDs de todos los jobs almacenados
    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
impl JobStore {
    /// Espera a que todos los jobs lleguen a un estado terminal
    pub(crate) fn wait_until_settled(&self, timeout: std::time::Duration) {
        let deadline = std::time::Instant::now() + timeout;
        while self
            .lock()
            .values()
            .any(|job| !job.is_terminal())
        {
            assert!(std::time::Instant::now() < deadline, "jobs did not settle");
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{JobStatus, MediaMode};
    use std::thread;

    fn record(id: &str) -> JobRecord {
        JobRecord::new(
            id.to_string(),
            "https://example.invalid/x".to_string(),
            MediaMode::Audio,
        )
    }

    // ==================== Basic Operations ====================

    #[test]
    fn test_store_create_and_get() {
        let store = JobStore::new();
        store.create(record("job-1")).unwrap();

        let retrieved = store.get("job-1").unwrap();
        assert_eq!(retrieved.id, "job-1");
        assert_eq!(retrieved.status, JobStatus::Starting);
    }

    #[test]
    fn test_store_rejects_duplicate() {
        let store = JobStore::new();
        store.create(record("job-1")).unwrap();
        store
            .update("job-1", |job| job.mark_downloading())
            .unwrap()
            .unwrap();

        let result = store.create(record("job-1"));
        assert!(matches!(result, Err(JobError::Duplicate(id)) if id == "job-1"));

        // El registro original no fue sobrescrito
        assert_eq!(store.get("job-1").unwrap().status, JobStatus::Downloading);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = JobStore::new();
        assert!(matches!(store.get("missing"), Err(JobError::NotFound(_))));
    }

    // ==================== Update Operations ====================

    #[test]
    fn test_store_update_nonexistent() {
        let store = JobStore::new();
        let result = store.update("missing", |job| job.status);
        assert!(matches!(result, Err(JobError::NotFound(_))));
    }

    #[test]
    fn test_store_update_returns_value() {
        let store = JobStore::new();
        store.create(record("job-1")).unwrap();

        let status = store.update("job-1", |job| job.status).unwrap();
        assert_eq!(status, JobStatus::Starting);
    }

    #[test]
    fn test_store_transition_flattens_errors() {
        let store = JobStore::new();
        store.create(record("job-1")).unwrap();

        store.transition("job-1", JobRecord::mark_downloading).unwrap();
        let again = store.transition("job-1", JobRecord::mark_downloading);
        assert!(matches!(again, Err(JobError::InvalidTransition { .. })));

        let missing = store.transition("nope", JobRecord::mark_downloading);
        assert!(matches!(missing, Err(JobError::NotFound(_))));
    }

    #[test]
    fn test_store_snapshot_is_detached() {
        let store = JobStore::new();
        store.create(record("job-1")).unwrap();

        let snapshot = store.get("job-1").unwrap();
        store.transition("job-1", JobRecord::mark_downloading).unwrap();

        assert_eq!(snapshot.status, JobStatus::Starting);
        assert_eq!(store.get("job-1").unwrap().status, JobStatus::Downloading);
    }

    // ==================== Clone / Concurrency ====================

    #[test]
    fn test_store_clone_shares_state() {
        let store = JobStore::new();
        let store_clone = store.clone();

        store.create(record("job-1")).unwrap();
        store_clone.create(record("job-2")).unwrap();

        assert_eq!(store.count(), 2);
        assert_eq!(store_clone.count(), 2);

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec!["job-1".to_string(), "job-2".to_string()]);
    }

    #[test]
    fn test_store_concurrent_creates_and_updates() {
        let store = JobStore::new();
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let id = format!("job-{}", i);
                store.create(record(&id)).unwrap();
                store.transition(&id, JobRecord::mark_downloading).unwrap();
                store
                    .transition(&id, |job| job.mark_failed(format!("error {}", i)))
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count(), 16);
        for i in 0..16 {
            let job = store.get(&format!("job-{}", i)).unwrap();
            assert_eq!(job.status, JobStatus::Failed);
            assert_eq!(job.error, Some(format!("error {}", i)));
        }
    }
}
