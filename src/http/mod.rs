//! # Módulo HTTP
//!
//! Implementación desde cero del subconjunto de HTTP/1.1 que usa el servidor:
//!
//! - Parsing de requests (request line, headers, body, query, cookies)
//! - Entidad `Response` que llenan los handlers
//! - Serialización de la respuesta (`ResponseBuilder`)
//! - Tabla de status codes y tabla MIME
//!
//! Fuera de alcance: keep-alive, chunked transfer encoding, pipelining.
//! Toda respuesta lleva `Connection: Close`.

pub mod builder; // Serialización de respuestas
pub mod cookie; // Cookie / Set-Cookie
pub mod headers; // Bloque de headers y lista ordenada de salida
pub mod mime; // Extensión → Content-Type
pub mod request; // Parsing de HTTP requests
pub mod response; // Entidad Response
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use builder::ResponseBuilder;
pub use cookie::Cookie;
pub use headers::HeaderList;
pub use mime::MimeTable;
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
