//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI y variables de entorno.
//! Se construye una vez en `main` y se pasa a cada componente al crearlo;
//! no hay configuración global mutable.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./ninja_server --port 8080 \
//!   --static-root ./static \
//!   --workers 16 \
//!   --queue-capacity 64 \
//!   --io-timeout-ms 30000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! NINJA_PORT=8080 NINJA_HOST=0.0.0.0 RUST_LOG=debug ./ninja_server
//! ```

use clap::{ArgAction, Parser, ValueEnum};
use std::time::Duration;

/// Formato de salida de los logs
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "ninja_server")]
#[command(about = "Servidor HTTP/1.1 minimalista con rutas dinámicas y archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "localhost", env = "NINJA_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "NINJA_PORT")]
    pub port: u16,

    /// Directorio raíz de los archivos estáticos
    #[arg(long = "static-root", default_value = "./static", env = "NINJA_STATIC_ROOT")]
    pub static_root: String,

    /// Directorio de templates HTML
    #[arg(long = "templates-dir", default_value = "./templates", env = "NINJA_TEMPLATES_DIR")]
    pub templates_dir: String,

    // === Workers ===

    /// Número de threads que atienden conexiones
    #[arg(long, default_value = "16", env = "NINJA_WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar un worker libre.
    /// Con la cola llena se responde 503 y se cierra.
    #[arg(long = "queue-capacity", default_value = "64", env = "NINJA_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === I/O ===

    /// Timeout de lectura y escritura por conexión en milisegundos
    #[arg(long = "io-timeout-ms", default_value = "30000", env = "NINJA_IO_TIMEOUT_MS")]
    pub io_timeout_ms: u64,

    /// Bytes por cada read() del socket
    #[arg(long = "read-chunk", default_value = "4096", env = "NINJA_READ_CHUNK")]
    pub read_chunk: usize,

    /// Tamaño máximo de cabecera + body
    #[arg(long = "max-request-bytes", default_value = "1048576", env = "NINJA_MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,

    // === Diagnóstico ===

    /// Si se indica, cada conexión guarda sus bytes crudos en
    /// <dump-dir>/request-<id>.bin
    #[arg(long = "dump-dir", env = "NINJA_DUMP_DIR")]
    pub dump_dir: Option<String>,

    /// Valor del header `Host` de las respuestas
    #[arg(long = "server-name", default_value = "NinjaServer/0.1", env = "NINJA_SERVER_NAME")]
    pub server_name: String,

    /// Formato de los logs
    #[arg(long = "log-format", value_enum, default_value = "text", env = "NINJA_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Verbosidad (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use ninja_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "localhost:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.io_timeout_ms == 0 {
            return Err("IO timeout must be > 0".to_string());
        }
        if self.read_chunk == 0 {
            return Err("Read chunk must be >= 1".to_string());
        }
        if self.max_request_bytes < self.read_chunk {
            return Err("Max request bytes must be >= read chunk".to_string());
        }
        if self.server_name.trim().is_empty() {
            return Err("Server name must not be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            static_root: "./static".to_string(),
            templates_dir: "./templates".to_string(),
            workers: 16,
            queue_capacity: 64,
            io_timeout_ms: 30_000,
            read_chunk: 4096,
            max_request_bytes: 1024 * 1024,
            dump_dir: None,
            server_name: "NinjaServer/0.1".to_string(),
            log_format: LogFormat::Text,
            verbose: 0,
        }
    }
}
