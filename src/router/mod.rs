//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla ordenada de patrones → handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router ─┬─ match → Handler dinámico → Response
//!                   └─ sin match → archivos estáticos
//! ```
//!
//! Cada patrón puede tener placeholders `<nombre>` que capturan un segmento
//! del path (sin `/`). Los patrones se compilan a regex una sola vez, al
//! registrarlos, y se anclan al path completo: `/user` no matchea
//! `/user_evil`. Se prueban en orden de registro y gana el primero.

use crate::error::HandlerResult;
use crate::http::Request;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Tipo de función handler
///
/// Recibe el request (con `params` ya completos) y retorna una Response o
/// un `HandlerError`.
pub type Handler = Arc<dyn Fn(&Request) -> HandlerResult + Send + Sync>;

/// Errores al registrar un patrón (solo ocurren al arrancar)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("invalid placeholder name {name:?} in pattern {pattern:?}")]
    InvalidPlaceholder { pattern: String, name: String },

    #[error("placeholder {name:?} appears twice in pattern {pattern:?}")]
    DuplicatePlaceholder { pattern: String, name: String },

    #[error("unbalanced '<' or '>' in pattern {0:?}")]
    Unbalanced(String),
}

/// Ruta compilada
pub struct Route {
    pattern: String,
    matcher: Regex,
    param_names: Vec<String>,
    handler: Handler,
}

impl Route {
    /// Patrón original (ej: "/user/<user_id>/profile")
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Nombres de los placeholders en orden de aparición
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Si el path matchea, retorna los pares (nombre, valor) capturados
    fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.matcher.captures(path)?;
        Some(
            self.param_names
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .finish()
    }
}

/// Resultado de resolver un request
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Una ruta dinámica matcheó; `params` ya fue completado
    Dynamic(&'a Route),

    /// Ninguna ruta matcheó: servir desde el directorio estático
    Static,
}

/// Router que mapea patrones a handlers
#[derive(Debug, Default)]
pub struct Router {
    /// Rutas en orden de registro
    routes: Vec<Route>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use ninja_server::router::Router;
    /// use ninja_server::http::{Request, Response};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .register("/user/<user_id>/profile", |req: &Request| {
    ///         Ok(Response::html(req.param("user_id").unwrap_or("?")))
    ///     })
    ///     .unwrap();
    /// assert_eq!(router.len(), 1);
    /// ```
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        let (matcher, param_names) = compile_pattern(pattern)?;
        self.routes.push(Route {
            pattern: pattern.to_string(),
            matcher,
            param_names,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Busca la primera ruta que matchea el path del request
    ///
    /// Nunca falla: si nada matchea, la resolución es `Static`.
    pub fn resolve(&self, request: &mut Request) -> Resolution<'_> {
        for route in &self.routes {
            if let Some(captures) = route.captures(request.path()) {
                for (name, value) in captures {
                    request.set_param(&name, &value);
                }
                return Resolution::Dynamic(route);
            }
        }

        Resolution::Static
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Convierte un patrón a regex anclada
///
/// Ejemplo: `/user/<user_id>/profile` → `^/user/(?P<user_id>[^/]+)/profile$`
fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
    }

    let mut regex_src = String::from("^");
    let mut param_names: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('<') {
        let literal = &rest[..open];
        if literal.contains('>') {
            return Err(RouteError::Unbalanced(pattern.to_string()));
        }
        regex_src.push_str(&regex::escape(literal));

        let after_open = &rest[open + 1..];
        let close = after_open
            .find('>')
            .ok_or_else(|| RouteError::Unbalanced(pattern.to_string()))?;
        let name = &after_open[..close];

        if !is_valid_param_name(name) {
            return Err(RouteError::InvalidPlaceholder {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }
        if !seen.insert(name.to_string()) {
            return Err(RouteError::DuplicatePlaceholder {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }

        regex_src.push_str(&format!("(?P<{}>[^/]+)", name));
        param_names.push(name.to_string());
        rest = &after_open[close + 1..];
    }

    if rest.contains('>') {
        return Err(RouteError::Unbalanced(pattern.to_string()));
    }
    regex_src.push_str(&regex::escape(rest));
    regex_src.push('$');

    // Los nombres ya están validados y el resto va escapado
    let matcher = Regex::new(&regex_src).map_err(|_| RouteError::InvalidPlaceholder {
        pattern: pattern.to_string(),
        name: param_names.join(","),
    })?;

    Ok((matcher, param_names))
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
