//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de fallas por conexión. Ninguna de estas sale del worker:
//! se registran y la conexión se cierra.

use crate::http::ParseError;
use std::io;
use thiserror::Error;

/// Fallas que terminan el procesamiento de una conexión
#[derive(Debug, Error)]
pub enum ServerError {
    /// Los bytes no forman un request válido
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ParseError),

    /// Cabecera + body superan `max_request_bytes`
    #[error("request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// Archivo estático inexistente o inaccesible
    #[error("static resource not found: {0}")]
    NotFound(String),

    /// Falló un handler o el template que usa
    #[error("handler failure: {0}")]
    Handler(#[from] HandlerError),

    /// Se venció el timeout de lectura/escritura del socket
    #[error("connection timed out")]
    Timeout,

    /// Error de lectura/escritura en el socket
    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // set_read_timeout/set_write_timeout reportan WouldBlock en Unix
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ServerError::Timeout,
            _ => ServerError::Transport(err),
        }
    }
}

/// Fallas dentro de un handler (vista o template)
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Template inexistente o variable de contexto faltante
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// El patrón de la ruta no trajo el parámetro esperado
    #[error("missing route parameter: {0}")]
    MissingParam(String),

    /// El handler hizo panic
    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

pub type HandlerResult = Result<crate::http::Response, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_kinds_map_to_timeout() {
        let err: ServerError = io::Error::new(io::ErrorKind::WouldBlock, "slow").into();
        assert!(matches!(err, ServerError::Timeout));

        let err: ServerError = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert!(matches!(err, ServerError::Timeout));
    }

    #[test]
    fn test_other_io_errors_are_transport() {
        let err: ServerError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(matches!(err, ServerError::Transport(_)));
    }

    #[test]
    fn test_parse_error_is_malformed() {
        let err: ServerError = ParseError::IncompleteRequest.into();
        assert!(matches!(err, ServerError::MalformedRequest(_)));
        assert!(err.to_string().contains("malformed request"));
    }

    #[test]
    fn test_handler_error_display() {
        let err = HandlerError::MissingParam("user_id".to_string());
        assert_eq!(err.to_string(), "missing route parameter: user_id");
    }
}
