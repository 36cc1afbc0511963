//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser desde cero de un request completo que ya está en memoria.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /parameters?debug=1 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 7\r\n
//! \r\n
//! a=1&b=2
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query VERSION`, exactamente tres tokens
//!    separados por un espacio
//! 2. **Headers**: pares `Name: Value` hasta el `\r\n\r\n`
//! 3. **Body**: los bytes restantes, sin tocar
//!
//! Si falta el `\r\n\r\n` el request es inválido: el parser falla en vez de
//! construir un request a medias.

use super::cookie::parse_cookie_header;
use super::headers::parse_header_block;
use memchr::memmem;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Delimitador entre la cabecera y el body
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP
///
/// El servidor no rechaza métodos desconocidos al parsear: es cada handler
/// quien decide si responde 405.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    PATCH,
    /// Cualquier otro token
    Other(String),
}

impl Method {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Other(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No llegó ningún byte
    #[error("Empty request")]
    EmptyRequest,

    /// Falta el `\r\n\r\n` que cierra la cabecera
    #[error("Incomplete HTTP request: missing header terminator")]
    IncompleteRequest,

    /// La cabecera no es UTF-8 válido
    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    /// La request line no tiene exactamente tres tokens
    #[error("Invalid request line: {0:?}")]
    InvalidRequestLine(String),

    /// El path no empieza con `/`
    #[error("Invalid request target: {0:?}")]
    InvalidTarget(String),

    /// La versión no tiene la forma `HTTP/x.y`
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Línea de header sin separador
    #[error("Invalid header: {0:?}")]
    InvalidHeader(String),
}

/// Request HTTP parseado
///
/// Inmutable salvo `params`, que el router completa al hacer match.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path sin query string, siempre empieza con `/`
    path: String,

    /// Query parameters decodificados (ej: {"num": "10"})
    query_params: HashMap<String, String>,

    /// Versión tal como llegó (ej: "HTTP/1.1")
    version: String,

    /// Headers con el nombre tal como llegó
    headers: HashMap<String, String>,

    /// Body crudo
    body: Vec<u8>,

    /// Cookies del header `Cookie`
    cookies: HashMap<String, String>,

    /// Parámetros extraídos del patrón de la ruta
    params: HashMap<String, String>,
}

/// Posición del `\r\n\r\n` dentro del buffer, si ya llegó
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    memmem::find(buffer, HEAD_TERMINATOR)
}

impl Request {
    /// Parsea un request desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use ninja_server::http::Request;
    ///
    /// let raw = b"GET /user/42/profile?tab=posts HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/user/42/profile");
    /// assert_eq!(request.query_param("tab"), Some("posts"));
    /// assert_eq!(request.header("Host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // 1. Separar cabecera y body
        let head_end = find_head_end(buffer).ok_or(ParseError::IncompleteRequest)?;
        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidEncoding)?;
        let body = buffer[head_end + HEAD_TERMINATOR.len()..].to_vec();

        // 2. Request line = hasta el primer \r\n de la cabecera
        let (request_line, header_block) = head.split_once("\r\n").unwrap_or((head, ""));
        let (method, path, query_params, version) = Self::parse_request_line(request_line)?;

        // 3. Headers
        let headers = parse_header_block(header_block)?;

        let cookies = lookup_ignore_case(&headers, "Cookie")
            .map(parse_cookie_header)
            .unwrap_or_default();

        Ok(Request {
            method,
            path,
            query_params,
            version,
            headers,
            body,
            cookies,
            params: HashMap::new(),
        })
    }

    /// Parsea la request line: `GET /path?query HTTP/1.1`
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, HashMap<String, String>, String), ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();

        // Exactamente 3 tokens no vacíos: METHOD TARGET VERSION
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ParseError::InvalidRequestLine(line.to_string()));
        }

        let method = Method::from_token(parts[0]);

        if !parts[1].starts_with('/') {
            return Err(ParseError::InvalidTarget(parts[1].to_string()));
        }
        let (path, query_params) = Self::parse_path_and_query(parts[1]);

        let version = parts[2].to_string();
        if !version.starts_with("HTTP/") {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, query_params, version))
    }

    /// Separa el path de la query string
    ///
    /// Ejemplo: "/now?fmt=iso" → ("/now", {"fmt": "iso"})
    fn parse_path_and_query(target: &str) -> (String, HashMap<String, String>) {
        match target.split_once('?') {
            Some((path, query)) => {
                let params = url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect();
                (path.to_string(), params)
            }
            None => (target.to_string(), HashMap::new()),
        }
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header: primero por nombre exacto, luego ignorando mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(|s| s.as_str())
            .or_else(|| lookup_ignore_case(&self.headers, name))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body como texto; los bytes inválidos se reemplazan
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodifica el body como `application/x-www-form-urlencoded`
    ///
    /// Cada nombre mapea a la lista de valores en el orden en que llegaron.
    /// Los valores vacíos se descartan.
    pub fn form_params(&self) -> BTreeMap<String, Vec<String>> {
        let mut form: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url::form_urlencoded::parse(&self.body) {
            if value.is_empty() {
                continue;
            }
            form.entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        form
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Guarda un parámetro de ruta, pisando uno previo con el mismo nombre
    pub fn set_param(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_string(), value.to_string());
    }
}

fn lookup_ignore_case<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
