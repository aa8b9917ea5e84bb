//! # Sistema de Jobs
//! src/jobs/mod.rs
//!
//! Motor asíncrono de descargas: cada envío crea un job, lo ejecuta en su
//! propio thread contra la herramienta externa y deja el resultado
//! consultable sin bloquear las conexiones HTTP.
//!
//! ## Componentes
//!
//! - `types`: registro del job y su máquina de estados
//! - `storage`: almacén concurrente de registros
//! - `runner`: ejecución del proceso externo con timeout
//! - `manager`: envío, consulta de estado y acceso al archivo
//! - `handlers`: endpoints HTTP
//!
//! ## Ciclo de vida
//!
//! ```text
//! starting → downloading → completed
//!     │            │
//!     └────────────┴──────→ failed
//! ```

pub mod handlers;
pub mod manager;
pub mod runner;
pub mod storage;
pub mod types;

pub use manager::{ArtifactHandle, JobManager};
pub use runner::{Artifact, RunnerConfig, TaskRunner};
pub use storage::JobStore;
pub use types::{JobRecord, JobStatus, MediaMode};
