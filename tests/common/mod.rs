//! Utilidades compartidas por los tests de integración
//! tests/common/mod.rs
//!
//! La herramienta de descarga se reemplaza por un script `sh` que recibe
//! los mismos argumentos que `yt-dlp`: lee la plantilla de `-o` y la URL
//! después de `--`, y deja `$dir` y `$url` disponibles para el cuerpo.

#![allow(dead_code)]

use download_server::jobs::{JobManager, JobRecord, RunnerConfig};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const STUB_PRELUDE: &str = r#"
out=""
url=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) shift; out="$1" ;;
    --) shift; url="$1"; break ;;
  esac
  shift
done
dir=$(dirname "$out")
"#;

/// Escribe un stub con el cuerpo dado y retorna su configuración
pub fn stub_config(workspace: &Path, body: &str) -> RunnerConfig {
    let script = workspace.join("stub-downloader.sh");
    std::fs::write(&script, format!("{}{}\n", STUB_PRELUDE, body)).expect("write stub");

    RunnerConfig {
        downloads_dir: workspace.join("downloads"),
        program: "sh".to_string(),
        program_args: vec![script.to_string_lossy().into_owned()],
        timeout: Duration::from_secs(10),
        poll_interval: Duration::from_millis(20),
        ..RunnerConfig::default()
    }
}

/// Gestor con un stub en un directorio temporal propio
pub fn stub_manager(body: &str) -> (TempDir, JobManager) {
    let workspace = tempfile::tempdir().expect("tempdir");
    let manager = JobManager::new(stub_config(workspace.path(), body));
    (workspace, manager)
}

/// Espera a que el job llegue a un estado terminal
pub fn wait_for_terminal(manager: &JobManager, job_id: &str, timeout: Duration) -> JobRecord {
    let deadline = Instant::now() + timeout;
    loop {
        let record = manager.status(job_id).expect("job should exist");
        if record.is_terminal() {
            return record;
        }
        assert!(
            Instant::now() < deadline,
            "job {job_id} did not reach terminal status"
        );
        thread::sleep(Duration::from_millis(20));
    }
}
