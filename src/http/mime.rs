//! # Tabla MIME
//! src/http/mime.rs
//!
//! Inferencia de `Content-Type` a partir de la extensión del path.
//! La extensión es lo que sigue al último `.` del path; sin entrada en la
//! tabla se usa `application/octet-stream`.

use std::collections::HashMap;

/// Tipo por defecto cuando no hay extensión o no está en la tabla
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Tabla extensión → MIME, inmutable una vez construida
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<String, String>,
    fallback: String,
}

impl MimeTable {
    /// Tabla vacía con el fallback indicado
    pub fn empty(fallback: &str) -> Self {
        Self {
            types: HashMap::new(),
            fallback: fallback.to_string(),
        }
    }

    pub fn with_type(mut self, extension: &str, mime: &str) -> Self {
        self.types.insert(extension.to_string(), mime.to_string());
        self
    }

    /// Resuelve el MIME para un path
    ///
    /// # Ejemplo
    /// ```
    /// use ninja_server::http::MimeTable;
    ///
    /// let table = MimeTable::default();
    /// assert_eq!(table.lookup("/style.css"), "text/css");
    /// assert_eq!(table.lookup("/unknown.xyz"), "application/octet-stream");
    /// ```
    pub fn lookup(&self, path: &str) -> &str {
        let extension = match path.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        };

        self.types
            .get(extension)
            .map(|s| s.as_str())
            .unwrap_or(&self.fallback)
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::empty(DEFAULT_MIME)
            .with_type("html", "text/html; charset=UTF-8")
            .with_type("css", "text/css")
            .with_type("png", "image/png")
            .with_type("jpg", "image/jpg")
            .with_type("gif", "image/gif")
    }
}
