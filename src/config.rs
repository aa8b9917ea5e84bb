//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de descargas con soporte para argumentos CLI
//! y variables de entorno (también leídas desde `.env`).
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./download_server --port 8080 \
//!   --downloads-dir /srv/downloads \
//!   --timeout-secs 600 \
//!   --tool python3 --tool-args "-m yt_dlp"
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 DOWNLOADS_DIR=/srv/downloads ./download_server
//! ```

use clap::Parser;

/// Configuración del servidor de descargas
#[derive(Debug, Clone, Parser)]
#[command(name = "download_server")]
#[command(about = "Servidor HTTP de descargas de audio y video en segundo plano")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Raíz de los directorios de descarga (uno por job)
    #[arg(long = "downloads-dir", default_value = "./downloads", env = "DOWNLOADS_DIR")]
    pub downloads_dir: String,

    // === Herramienta externa ===

    /// Programa que realiza la descarga
    #[arg(long, default_value = "yt-dlp", env = "DOWNLOAD_TOOL")]
    pub tool: String,

    /// Argumentos fijos antes de los del perfil, separados por espacios
    #[arg(
        long = "tool-args",
        env = "DOWNLOAD_TOOL_ARGS",
        value_delimiter = ' ',
        allow_hyphen_values = true
    )]
    pub tool_args: Vec<String>,

    // === Límites ===

    /// Tiempo máximo de una descarga en segundos
    #[arg(long = "timeout-secs", default_value = "600", env = "DOWNLOAD_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Largo máximo (en caracteres) del mensaje de error de un job
    #[arg(long = "error-max-len", default_value = "500", env = "ERROR_MAX_LEN")]
    pub error_max_len: usize,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use download_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.tool.trim().is_empty() {
            return Err("Download tool must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Download timeout must be > 0".to_string());
        }
        if self.error_max_len == 0 {
            return Err("Error max length must be > 0".to_string());
        }
        if self.downloads_dir.trim().is_empty() {
            return Err("Downloads dir must not be empty".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            downloads_dir = %self.downloads_dir,
            tool = %self.tool,
            tool_args = ?self.tool_args,
            timeout_secs = self.timeout_secs,
            error_max_len = self.error_max_len,
            "configuration loaded"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            downloads_dir: "./downloads".to_string(),
            tool: "yt-dlp".to_string(),
            tool_args: Vec::new(),
            timeout_secs: 600,
            error_max_len: 500,
        }
    }
}
