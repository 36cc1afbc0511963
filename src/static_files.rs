//! # Archivos Estáticos
//! src/static_files.rs
//!
//! Responde los requests que no matchean ninguna ruta dinámica leyendo un
//! archivo bajo el directorio raíz configurado.
//!
//! ## Política de traversal
//!
//! Se quita un único `/` inicial y el resto se recorre componente por
//! componente. `..`, una raíz absoluta o un prefijo de unidad hacen que el
//! request sea `NotFound` sin tocar el disco. Los `.` se ignoran.

use crate::error::ServerError;
use crate::http::{Request, Response, StatusCode};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolver de contenido estático
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Traduce el path del request a un path dentro de `root`
    ///
    /// Retorna `None` si el path intenta salir de la raíz.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let relative = url_path.strip_prefix('/').unwrap_or(url_path);

        let mut full = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => full.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(full)
    }

    /// Lee el archivo completo
    ///
    /// Cualquier falla del sistema operativo (no existe, es directorio,
    /// permisos) se reporta igual: `NotFound`.
    pub fn load(&self, url_path: &str) -> Result<Vec<u8>, ServerError> {
        let file_path = self.map_path(url_path).ok_or_else(|| {
            debug!(path = url_path, "Path rechazado por traversal");
            ServerError::NotFound(url_path.to_string())
        })?;

        fs::read(&file_path).map_err(|e| {
            debug!(path = %file_path.display(), error = %e, "No se pudo leer archivo estático");
            ServerError::NotFound(url_path.to_string())
        })
    }

    /// Handler implícito para requests sin ruta dinámica
    ///
    /// 200 con el contenido (Content-Type inferido después, al serializar)
    /// o 404 con el body HTML fijo.
    pub fn serve(&self, request: &Request) -> Response {
        match self.load(request.path()) {
            Ok(bytes) => Response::new(StatusCode::Ok).with_body_bytes(bytes),
            Err(_) => Response::not_found(),
        }
    }
}
