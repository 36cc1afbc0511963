//! # Templates
//! src/templates.rs
//!
//! `render(template_id, context) -> bytes` sobre minijinja.
//!
//! Los templates se cargan bajo demanda desde el directorio configurado y
//! quedan cacheados en el `Environment`. El modo de variables indefinidas es
//! estricto: una clave que falta en el contexto es un error, igual que un
//! template que no existe. Ambos llegan al worker como `HandlerError`.

use crate::error::HandlerError;
use minijinja::{path_loader, Environment, UndefinedBehavior};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Renderer compartido por todos los handlers
pub struct TemplateRenderer {
    env: Environment<'static>,
    dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();

        let mut env = Environment::new();
        env.set_loader(path_loader(dir.clone()));
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        Self { env, dir }
    }

    /// Renderiza `template_id` con `context` y retorna los bytes UTF-8
    ///
    /// Los templates `.html` escapan automáticamente los valores del contexto.
    pub fn render<S: Serialize>(&self, template_id: &str, context: S) -> Result<Vec<u8>, HandlerError> {
        let template = self.env.get_template(template_id)?;
        let rendered = template.render(context)?;
        Ok(rendered.into_bytes())
    }
}

impl fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRenderer").field("dir", &self.dir).finish()
    }
}
