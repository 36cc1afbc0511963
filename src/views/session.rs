//! # Cookies y Sesión
//! src/views/session.rs
//!
//! Un login sin contraseña: el nombre de usuario viaja en una cookie con
//! `Max-Age=60` y `/welcome` la lee de vuelta.

use crate::error::HandlerResult;
use crate::http::response::HTML_UTF8;
use crate::http::{Cookie, Method, Request, Response, StatusCode};
use crate::templates::TemplateRenderer;
use serde_json::json;
use std::collections::BTreeMap;

/// Duración de la cookie de login en segundos
pub const LOGIN_COOKIE_MAX_AGE: u64 = 60;

/// Handler para /set_cookie
pub fn set_cookie(_req: &Request) -> HandlerResult {
    Ok(Response::html("<html><body><h1>Cookies set</h1></body></html>")
        .with_cookie(Cookie::new("username", "TARO"))
        .with_cookie(Cookie::new("email", "taro@example.com")))
}

/// Handler para /login
///
/// - GET: formulario (`login.html`)
/// - POST con `username`: cookie + redirect a /welcome
/// - POST sin `username`: redirect a /login
/// - Otro método: 405
pub fn login(req: &Request, templates: &TemplateRenderer) -> HandlerResult {
    match req.method() {
        Method::GET => {
            let body = templates.render("login.html", json!({}))?;
            Ok(Response::new(StatusCode::Ok)
                .with_content_type(HTML_UTF8)
                .with_body_bytes(body))
        }
        Method::POST => {
            let form = req.form_params();
            let username = form.get("username").and_then(|values| values.first());

            match username {
                Some(name) => Ok(Response::redirect("/welcome")
                    .with_cookie(Cookie::new("username", name).with_max_age(LOGIN_COOKIE_MAX_AGE))),
                None => Ok(Response::redirect("/login")),
            }
        }
        _ => Ok(Response::method_not_allowed()),
    }
}

/// Handler para /welcome
///
/// Sin cookie `username` redirige a /login.
pub fn welcome(req: &Request, templates: &TemplateRenderer) -> HandlerResult {
    let Some(username) = req.cookie("username") else {
        return Ok(Response::redirect("/login"));
    };

    let cookies: BTreeMap<&str, &str> = req
        .cookies()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let body = templates.render(
        "welcome.html",
        json!({
            "username": username,
            "cookies": cookies,
        }),
    )?;

    Ok(Response::new(StatusCode::Ok)
        .with_content_type(HTML_UTF8)
        .with_body_bytes(body))
}
