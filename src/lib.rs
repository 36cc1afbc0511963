//! # Ninja Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 minimalista sobre sockets TCP bloqueantes. Una
//! conexión = un request = una respuesta, siempre con `Connection: Close`.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests, cookies, status, MIME y serialización
//! - `router`: tabla de rutas con placeholders `<name>`, primer match gana
//! - `static_files`: fallback implícito a archivos bajo un directorio raíz
//! - `templates`: render de HTML con minijinja
//! - `views`: páginas dinámicas incluidas
//! - `server`: acceptor, pool de workers y worker de conexión
//! - `config` / `logging` / `error`: CLI, tracing y taxonomía de errores
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use ninja_server::config::Config;
//! use ninja_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::new(config).expect("rutas inválidas");
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod static_files;
pub mod templates;
pub mod views;
