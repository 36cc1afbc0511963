//! # Respuestas HTTP
//! src/http/response.rs
//!
//! Entidad que producen los handlers. Es mutable hasta que el
//! `ResponseBuilder` la serializa; los headers estándar (Date, Host,
//! Content-Length, Connection, Content-Type) no se guardan aquí sino que se
//! calculan al serializar.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use ninja_server::http::{Cookie, Response, StatusCode};
//!
//! let response = Response::redirect("/welcome")
//!     .with_cookie(Cookie::new("username", "TARO").with_max_age(60));
//!
//! assert_eq!(response.status(), StatusCode::Found);
//! assert_eq!(response.headers().get("Location"), Some("/welcome"));
//! ```

use super::cookie::Cookie;
use super::headers::HeaderList;
use super::StatusCode;

/// Content-Type de las páginas HTML generadas por el servidor
pub const HTML_UTF8: &str = "text/html; charset=UTF-8";

pub const NOT_FOUND_BODY: &[u8] = b"<html><body><h1>404 Not Found!</h1></body></html>";
pub const METHOD_NOT_ALLOWED_BODY: &[u8] =
    b"<html><body><h1>405 Method Not Allowed!</h1></body></html>";
pub const BAD_REQUEST_BODY: &[u8] = b"<html><body><h1>400 Bad Request!</h1></body></html>";
pub const PAYLOAD_TOO_LARGE_BODY: &[u8] =
    b"<html><body><h1>413 Payload Too Large!</h1></body></html>";
pub const INTERNAL_ERROR_BODY: &[u8] =
    b"<html><body><h1>500 Internal Server Error!</h1></body></html>";
pub const SERVICE_UNAVAILABLE_BODY: &[u8] =
    b"<html><body><h1>503 Service Unavailable!</h1></body></html>";

/// Respuesta HTTP producida por un handler
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado
    status: StatusCode,

    /// Cuerpo en bytes; los strings se codifican a UTF-8 al asignarlos
    body: Vec<u8>,

    /// `None` = inferir desde la extensión del path al serializar
    content_type: Option<String>,

    /// Headers extra (ej: `Location`), en orden de inserción
    headers: HeaderList,

    /// Cookies a emitir, en el orden en que se agregaron
    cookies: Vec<Cookie>,
}

impl Response {
    /// Crea una respuesta vacía con el código indicado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
            content_type: None,
            headers: HeaderList::new(),
            cookies: Vec::new(),
        }
    }

    /// 200 con body HTML
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_content_type(HTML_UTF8)
            .with_body(body)
    }

    /// 302 hacia `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::Found).with_header("Location", location)
    }

    /// Respuesta de error con el body HTML fijo del código
    ///
    /// Para códigos sin página fija se usa la status line como título.
    pub fn error(status: StatusCode) -> Self {
        let body = match status {
            StatusCode::NotFound => NOT_FOUND_BODY.to_vec(),
            StatusCode::MethodNotAllowed => METHOD_NOT_ALLOWED_BODY.to_vec(),
            StatusCode::BadRequest => BAD_REQUEST_BODY.to_vec(),
            StatusCode::PayloadTooLarge => PAYLOAD_TOO_LARGE_BODY.to_vec(),
            StatusCode::InternalServerError => INTERNAL_ERROR_BODY.to_vec(),
            StatusCode::ServiceUnavailable => SERVICE_UNAVAILABLE_BODY.to_vec(),
            other => format!("<html><body><h1>{}</h1></body></html>", other).into_bytes(),
        };

        Self::new(status)
            .with_content_type(HTML_UTF8)
            .with_body_bytes(body)
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::error(StatusCode::MethodNotAllowed)
    }

    /// Establece el cuerpo desde un string (se codifica como UTF-8)
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Establece el cuerpo desde bytes (archivos estáticos, imágenes)
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Fija el Content-Type y desactiva la inferencia por extensión
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Agrega un header extra; si ya existe se sobrescribe
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}
