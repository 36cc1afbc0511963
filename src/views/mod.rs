//! # Vistas del Servidor
//!
//! Handlers de las páginas dinámicas. Para el núcleo del servidor son
//! colaboradores externos: funciones `Request → Response` que pueden leer
//! `params`, headers, cookies y body.
//!
//! ## Categorías
//!
//! - **pages**: /now, /show_request, /parameters, /user/<user_id>/profile
//! - **session**: /set_cookie, /login, /welcome (cookies y redirecciones)

pub mod pages;
pub mod session;

use crate::router::{RouteError, Router};
use crate::templates::TemplateRenderer;
use std::sync::Arc;

pub use pages::*;
pub use session::*;

/// Registra todas las vistas en el orden en que se deben probar
pub fn register_all(router: &mut Router, templates: Arc<TemplateRenderer>) -> Result<(), RouteError> {
    let now_templates = Arc::clone(&templates);
    router.register("/now", move |req| pages::now(req, &now_templates))?;
    router.register("/show_request", pages::show_request)?;
    router.register("/parameters", pages::parameters)?;
    router.register("/user/<user_id>/profile", pages::user_profile)?;

    router.register("/set_cookie", session::set_cookie)?;
    let login_templates = Arc::clone(&templates);
    router.register("/login", move |req| session::login(req, &login_templates))?;
    router.register("/welcome", move |req| session::welcome(req, &templates))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = Router::new();
        register_all(&mut router, Arc::new(TemplateRenderer::new(dir.path()))).unwrap();

        let patterns: Vec<&str> = router.routes().iter().map(|r| r.pattern()).collect();
        assert_eq!(
            patterns,
            vec![
                "/now",
                "/show_request",
                "/parameters",
                "/user/<user_id>/profile",
                "/set_cookie",
                "/login",
                "/welcome",
            ]
        );
    }
}
