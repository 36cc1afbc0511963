//! # Páginas Dinámicas
//! src/views/pages.rs
//!
//! - /now: fecha y hora actual (template `now.html`)
//! - /show_request: muestra el request tal como llegó
//! - /parameters: parámetros de un POST form-urlencoded
//! - /user/<user_id>/profile: recurso estilo REST

use crate::error::{HandlerError, HandlerResult};
use crate::http::response::HTML_UTF8;
use crate::http::{Method, Request, Response, StatusCode};
use crate::templates::TemplateRenderer;
use chrono::Local;
use minijinja::HtmlEscape;
use serde_json::json;
use std::collections::BTreeMap;

/// Hora local con su offset, p. ej. `2026-10-18 09:30:00 -0600`
pub const NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Handler para /now
///
/// Renderiza `now.html` con la hora local del momento de la respuesta,
/// en formato `NOW_FORMAT`.
pub fn now(_req: &Request, templates: &TemplateRenderer) -> HandlerResult {
    let now = Local::now().format(NOW_FORMAT).to_string();
    let body = templates.render("now.html", json!({ "now": now }))?;

    Ok(Response::new(StatusCode::Ok)
        .with_content_type(HTML_UTF8)
        .with_body_bytes(body))
}

/// Handler para /show_request
///
/// Devuelve la request line, los headers (ordenados por nombre) y el body.
pub fn show_request(req: &Request) -> HandlerResult {
    let headers: BTreeMap<&str, &str> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let header_lines = headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n");

    let html = format!(
        "<html>\n<body>\n  <h1>Request Line:</h1>\n  <p>{} {} {}</p>\n  <h1>Headers:</h1>\n  <pre>{}</pre>\n  <h1>Body:</h1>\n  <pre>{}</pre>\n</body>\n</html>\n",
        HtmlEscape(req.method().as_str()),
        HtmlEscape(req.path()),
        HtmlEscape(req.version()),
        HtmlEscape(&header_lines),
        HtmlEscape(&req.body_lossy()),
    );

    Ok(Response::html(&html))
}

/// Handler para /parameters
///
/// Solo acepta POST. El body `a=1&b=2` se muestra como
/// `{"a":["1"],"b":["2"]}`. Nombres y valores van escapados; la sintaxis
/// JSON queda tal cual.
pub fn parameters(req: &Request) -> HandlerResult {
    if req.method() != &Method::POST {
        return Ok(Response::method_not_allowed());
    }

    let escaped: BTreeMap<String, Vec<String>> = req
        .form_params()
        .into_iter()
        .map(|(name, values)| {
            let values = values.iter().map(|v| HtmlEscape(v).to_string()).collect();
            (HtmlEscape(&name).to_string(), values)
        })
        .collect();

    let params = serde_json::to_string(&escaped).map_err(|e| HandlerError::Other(e.to_string()))?;

    let html = format!(
        "<html>\n<body>\n  <h1>Parameters:</h1>\n  <pre>{}</pre>\n</body>\n</html>\n",
        params
    );

    Ok(Response::html(&html))
}

/// Handler para /user/<user_id>/profile
pub fn user_profile(req: &Request) -> HandlerResult {
    let user_id = req
        .param("user_id")
        .ok_or_else(|| HandlerError::MissingParam("user_id".to_string()))?;

    let html = format!(
        "<html>\n<body>\n  <h1>Profile</h1>\n  <p>ID: {}</p>\n</body>\n</html>\n",
        HtmlEscape(user_id)
    );

    Ok(Response::html(&html))
}
