//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que atiende múltiples conexiones simultáneas usando
//! threads. Cada conexión se procesa en su propio thread y recibe un único
//! request; las descargas corren en threads aparte (ver `jobs`), así que
//! ninguna conexión espera a una descarga.

use crate::config::Config;
use crate::http::{find_header_end, Method, Request, Response, StatusCode};
use crate::jobs::handlers as job_handlers;
use crate::jobs::{JobManager, RunnerConfig};
use crate::router::{add_common_headers, Router};
use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tamaño máximo de request line + headers
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

/// Tamaño máximo del body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Tiempo máximo esperando datos del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Rutas de la API de descargas
pub fn build_router() -> Router<JobManager> {
    let mut router = Router::new();
    router.register(Method::POST, "/api/download", job_handlers::submit_handler);
    router.register(Method::GET, "/api/status/{id}", job_handlers::status_handler);
    router.register(Method::GET, "/api/file/{id}", job_handlers::file_handler);
    router
}

/// Servidor HTTP concurrente
pub struct Server {
    config: Config,
    router: Arc<Router<JobManager>>,
    manager: JobManager,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let manager = JobManager::new(RunnerConfig::from_config(&config));
        Self::with_manager(config, manager)
    }

    /// Crea el servidor sobre un gestor ya construido
    pub fn with_manager(config: Config, manager: JobManager) -> Self {
        Self {
            config,
            router: Arc::new(build_router()),
            manager,
        }
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    /// Hace bind en `host:port` y atiende conexiones indefinidamente
    pub fn run(&self) -> io::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;
        tracing::info!(%address, "server listening");

        self.serve(listener)
    }

    /// Acepta conexiones del listener, un thread por conexión
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let manager = self.manager.clone();

                    let peer = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    tracing::debug!(%peer, "connection accepted");

                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(stream, &router, &manager) {
                            tracing::warn!(%peer, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }

    /// Lee un request, lo enruta y escribe la respuesta
    pub fn handle_connection(
        mut stream: TcpStream,
        router: &Router<JobManager>,
        manager: &JobManager,
    ) -> io::Result<()> {
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let (response, method, path) = match read_request(&mut stream)? {
            ReadOutcome::Closed => {
                tracing::debug!("connection closed before request");
                return Ok(());
            }
            ReadOutcome::TooLarge(what) => (
                Response::error(StatusCode::PayloadTooLarge, &format!("{} too large", what)),
                None,
                String::new(),
            ),
            ReadOutcome::Complete(buffer) => match Request::parse(&buffer) {
                Ok(request) => (
                    router.route(&request, manager),
                    Some(request.method()),
                    request.path().to_string(),
                ),
                Err(e) => (
                    Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
                    None,
                    String::new(),
                ),
            },
        };

        let mut response = response;
        add_common_headers(&mut response);
        response.add_header("X-Request-Id", &request_id);
        let status = response.status();

        if method == Some(Method::HEAD) {
            response.write_head_to(&mut stream)?;
        } else {
            response.write_to(&mut stream)?;
        }

        tracing::info!(
            request_id = %request_id,
            method = method.map(|m| m.as_str()).unwrap_or("-"),
            path = %path,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "request handled"
        );

        Ok(())
    }
}

enum ReadOutcome {
    /// El cliente cerró sin enviar nada
    Closed,
    /// Headers o body exceden el límite
    TooLarge(&'static str),
    /// Headers completos más `Content-Length` bytes de body
    Complete(Vec<u8>),
}

fn read_request<R: Read>(stream: &mut R) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Ok(ReadOutcome::TooLarge("Headers"));
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            // Sin separador: se intenta parsear lo recibido (o se cierra)
            if buffer.is_empty() {
                return Ok(ReadOutcome::Closed);
            }
            return Ok(ReadOutcome::Complete(buffer));
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    if header_end > MAX_HEADER_BYTES {
        return Ok(ReadOutcome::TooLarge("Headers"));
    }

    let body_len = match Request::parse(&buffer[..header_end + 4]) {
        Ok(head) => head.content_length().unwrap_or(0),
        Err(_) => return Ok(ReadOutcome::Complete(buffer)),
    };
    if body_len > MAX_BODY_BYTES {
        return Ok(ReadOutcome::TooLarge("Body"));
    }

    let total = header_end + 4 + body_len;
    while buffer.len() < total {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    buffer.truncate(total);

    Ok(ReadOutcome::Complete(buffer))
}
