//! # Runner de Tareas Externas
//! src/jobs/runner.rs
//!
//! Ejecuta el proceso externo de un único job, con un tiempo máximo de
//! reloj, y clasifica el resultado:
//!
//! 1. Crea `<downloads_dir>/<job_id>/` (un directorio por job)
//! 2. `starting` → `downloading`
//! 3. Lanza la herramienta y espera hasta `timeout`
//! 4. Código != 0 → `failed` con el diagnóstico truncado
//! 5. Timeout → `failed` con mensaje fijo
//! 6. Código 0 → busca el archivo producido; sin archivo → `failed`
//!
//! `run` nunca devuelve error: toda falla termina escrita en el job.

use crate::config::Config;
use crate::error::JobError;
use crate::jobs::storage::JobStore;
use crate::jobs::types::MediaMode;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Bytes máximos guardados por stream (stdout / stderr)
const MAX_CAPTURE_BYTES: usize = 64 * 1024;

/// Restos de descargas parciales que no cuentan como resultado
const LEFTOVER_SUFFIXES: [&str; 4] = [".part", ".ytdl", ".tmp", ".temp"];

/// Configuración del runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Raíz donde se crean los directorios por job
    pub downloads_dir: PathBuf,

    /// Programa a invocar (ej: `yt-dlp` o un intérprete)
    pub program: String,

    /// Argumentos iniciales, antes de los del perfil (ej: `-m yt_dlp`)
    pub program_args: Vec<String>,

    /// Tiempo máximo de ejecución por job
    pub timeout: Duration,

    /// Largo máximo (en caracteres) del error guardado en el job
    pub error_max_len: usize,

    /// Cada cuánto se consulta si el proceso terminó
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("./downloads"),
            program: "yt-dlp".to_string(),
            program_args: Vec::new(),
            timeout: Duration::from_secs(600),
            error_max_len: 500,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl RunnerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            downloads_dir: PathBuf::from(&config.downloads_dir),
            program: config.tool.clone(),
            program_args: config.tool_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            error_max_len: config.error_max_len,
            ..Self::default()
        }
    }
}

/// Archivo producido por un job exitoso
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

/// Resultado crudo del proceso externo
struct ProcessOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl ProcessOutput {
    /// stderr, si está vacío stdout, y si no el código de salida
    fn diagnostic(&self) -> String {
        for stream in [&self.stderr, &self.stdout] {
            let text = String::from_utf8_lossy(stream);
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
        format!("Download tool exited with {}", self.status)
    }
}

/// Ejecuta jobs contra la herramienta externa
#[derive(Clone)]
pub struct TaskRunner {
    config: Arc<RunnerConfig>,
    store: JobStore,
}

impl TaskRunner {
    pub fn new(config: RunnerConfig, store: JobStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Directorio exclusivo del job
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.config.downloads_dir.join(job_id)
    }

    /// Argumentos completos de la invocación para un job
    pub fn command_args(&self, mode: MediaMode, job_dir: &Path, resource_locator: &str) -> Vec<String> {
        let output_template = job_dir.join("%(title)s.%(ext)s");

        let mut args = self.config.program_args.clone();
        args.push("--no-playlist".to_string());
        args.extend(mode.profile_args());
        args.push("-o".to_string());
        args.push(output_template.to_string_lossy().into_owned());
        // La URL nunca se interpreta como opción
        args.push("--".to_string());
        args.push(resource_locator.to_string());
        args
    }

    /// Ejecuta el job completo y guarda el resultado en el store
    pub fn run(&self, job_id: &str, resource_locator: &str, mode: MediaMode) {
        tracing::info!(job_id, mode = mode.as_str(), "download started");

        let recorded = match self.execute(job_id, resource_locator, mode) {
            Ok(artifact) => {
                tracing::info!(job_id, artifact = %artifact.name, "download completed");
                let path = artifact.path.to_string_lossy().into_owned();
                self.store
                    .transition(job_id, |job| job.mark_completed(artifact.name, path))
            }
            Err(err) => {
                let message = truncate_chars(&err.to_string(), self.config.error_max_len);
                tracing::warn!(job_id, error = %message, "download failed");
                self.store.transition(job_id, |job| job.mark_failed(message))
            }
        };

        if let Err(err) = recorded {
            tracing::error!(job_id, error = %err, "could not record job outcome");
        }
    }

    fn execute(&self, job_id: &str, resource_locator: &str, mode: MediaMode) -> Result<Artifact, JobError> {
        let job_dir = self.job_dir(job_id);
        fs::create_dir_all(&job_dir)?;

        let args = self.command_args(mode, &job_dir, resource_locator);
        self.store.transition(job_id, |job| job.mark_downloading())?;

        let output = self.invoke(&args)?;
        if !output.status.success() {
            return Err(JobError::Execution(output.diagnostic()));
        }

        discover_artifact(&job_dir)
    }

    /// Lanza el proceso y espera con timeout
    fn invoke(&self, args: &[String]) -> Result<ProcessOutput, JobError> {
        let mut child = Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                JobError::Execution(format!("Failed to launch '{}': {}", self.config.program, e))
            })?;

        // Los pipes se vacían en paralelo para que el hijo no se bloquee
        let stdout = spawn_drain(child.stdout.take());
        let stderr = spawn_drain(child.stderr.take());

        let start = Instant::now();
        let deadline = start + self.config.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Un nieto puede heredar los pipes y mantenerlos abiertos:
                    // la espera del EOF también cuenta contra el límite.
                    return match (collect(stdout, deadline), collect(stderr, deadline)) {
                        (Some(stdout), Some(stderr)) => Ok(ProcessOutput {
                            status,
                            stdout,
                            stderr,
                        }),
                        _ => {
                            tracing::warn!(%status, "tool exited but its output pipes stayed open");
                            Err(JobError::Timeout(self.config.timeout))
                        }
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(e.into());
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= self.config.timeout {
                // Los hilos lectores no se esperan: un nieto del proceso
                // podría mantener el pipe abierto.
                terminate(&mut child);
                return Err(JobError::Timeout(self.config.timeout));
            }

            thread::sleep(self.config.poll_interval.min(self.config.timeout - elapsed));
        }
    }
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_drain<R: Read + Send + 'static>(reader: Option<R>) -> Option<Receiver<Vec<u8>>> {
    reader.map(|reader| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(drain(reader));
        });
        rx
    })
}

/// Espera lo capturado de un stream hasta `deadline`
///
/// `None` si el stream sigue abierto al vencer el plazo.
fn collect(receiver: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(receiver) = receiver else {
        return Some(Vec::new());
    };
    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(bytes),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Lee el stream completo guardando como máximo `MAX_CAPTURE_BYTES`
fn drain<R: Read>(mut reader: R) -> Vec<u8> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_CAPTURE_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}

fn is_leftover(name: &str) -> bool {
    name.starts_with('.') || LEFTOVER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Busca el archivo producido en el directorio del job
///
/// Ignora ocultos y restos de descargas parciales. Si quedan varios gana
/// el modificado más recientemente; a igual fecha, el primero por nombre.
pub fn discover_artifact(dir: &Path) -> Result<Artifact, JobError> {
    let mut candidates = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_leftover(&name) {
            continue;
        }
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, name, entry.path()));
    }

    candidates
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(_, name, path)| Artifact { name, path })
        .ok_or(JobError::OutputMissing)
}

/// Corta `text` a `max` caracteres sin partir un carácter UTF-8
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
