//! # Ninja Server - Entry Point
//! src/main.rs
//!
//! Lee la configuración (CLI + variables de entorno), inicializa el logging
//! y bloquea en el loop de accept.

use ninja_server::config::Config;
use ninja_server::logging;
use ninja_server::server::Server;
use tracing::{error, info};

fn main() {
    let config = Config::new();
    logging::init(config.verbose, config.log_format);

    if let Err(e) = config.validate() {
        error!(error = %e, "Configuración inválida");
        std::process::exit(1);
    }

    info!(
        host = %config.host,
        port = config.port,
        static_root = %config.static_root,
        templates_dir = %config.templates_dir,
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        io_timeout_ms = config.io_timeout_ms,
        "Configuración"
    );

    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "No se pudieron registrar las rutas");
            std::process::exit(1);
        }
    };

    // Bloquea el thread principal
    if let Err(e) = server.run() {
        error!(error = %e, "Error fatal");
        std::process::exit(1);
    }
}
