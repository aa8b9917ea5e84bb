//! # Download Server - Entry Point
//! src/main.rs
//!
//! Carga `.env`, inicializa el logging, lee la configuración y arranca el
//! servidor.

use clap::Parser;
use download_server::config::Config;
use download_server::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "download_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }
    config.log_summary();

    if let Err(e) = std::fs::create_dir_all(&config.downloads_dir) {
        tracing::error!(dir = %config.downloads_dir, error = %e, "could not create downloads dir");
        std::process::exit(1);
    }

    let server = Server::new(config);
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
