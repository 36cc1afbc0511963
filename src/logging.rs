//! # Logging
//! src/logging.rs
//!
//! Inicializa el subscriber de `tracing`. El nivel base sale de la
//! verbosidad (`-v`) y `RUST_LOG` lo puede sobrescribir.

use crate::config::LogFormat;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Directiva por defecto según la cantidad de `-v`
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Instala el subscriber global
///
/// Usa `try_init`: si ya hay uno instalado (ej: en tests) no hace nada.
pub fn init(verbosity: u8, format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(
            default_directive(verbosity)
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into()),
        )
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true);

    let _ = match format {
        LogFormat::Text => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
}
