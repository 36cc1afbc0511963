//! # Serialización de Respuestas
//! src/http/builder.rs
//!
//! Convierte una `Response` en los bytes exactos que se escriben al socket.
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Date: Sun, 18 Oct 2026 10:00:00 GMT\r\n
//! Host: NinjaServer/0.1\r\n
//! Content-Length: 13\r\n
//! Connection: Close\r\n
//! Content-Type: text/html; charset=UTF-8\r\n
//! Set-Cookie: username=TARO; Max-Age=60\r\n     (0..n)
//! Location: /welcome\r\n                        (0..n headers extra)
//! \r\n
//! <body>
//! ```

use super::mime::MimeTable;
use super::response::Response;
use std::sync::Arc;
use std::time::SystemTime;

/// Serializador de respuestas
///
/// Compartido por todos los workers: solo contiene configuración inmutable.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    /// Valor del header `Host` (identidad del servidor)
    server_name: String,

    /// Tabla para inferir Content-Type cuando el handler no lo fijó
    mime: Arc<MimeTable>,
}

impl ResponseBuilder {
    pub fn new(server_name: &str, mime: Arc<MimeTable>) -> Self {
        Self {
            server_name: server_name.to_string(),
            mime,
        }
    }

    /// Serializa con la hora actual
    ///
    /// `request_path` es el path del request original; se usa solo para
    /// inferir el Content-Type. Sin request (ej: 400 por parse error) y sin
    /// Content-Type explícito se usa el fallback de la tabla.
    pub fn build(&self, response: &Response, request_path: Option<&str>) -> Vec<u8> {
        self.build_at(response, request_path, SystemTime::now())
    }

    /// Igual que `build` pero con la hora del header `Date` fija
    pub fn build_at(
        &self,
        response: &Response,
        request_path: Option<&str>,
        now: SystemTime,
    ) -> Vec<u8> {
        let content_type = self.resolve_content_type(response, request_path);
        let body = response.body();

        let mut head = String::with_capacity(256);

        // 1. Status line
        head.push_str(&format!("HTTP/1.1 {}\r\n", response.status()));

        // 2. Headers estándar, en orden fijo
        head.push_str(&format!("Date: {}\r\n", httpdate::fmt_http_date(now)));
        head.push_str(&format!("Host: {}\r\n", self.server_name));
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        head.push_str("Connection: Close\r\n");
        head.push_str(&format!("Content-Type: {}\r\n", content_type));

        // 3. Cookies en el orden del handler
        for cookie in response.cookies() {
            head.push_str(&format!("Set-Cookie: {}\r\n", cookie.to_header_value()));
        }

        // 4. Headers extra en orden de inserción
        for (name, value) in response.headers().iter() {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        // 5. Línea vacía y body sin transformar
        head.push_str("\r\n");

        let mut bytes = Vec::with_capacity(head.len() + body.len());
        bytes.extend_from_slice(head.as_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    fn resolve_content_type<'a>(
        &'a self,
        response: &'a Response,
        request_path: Option<&str>,
    ) -> &'a str {
        if let Some(explicit) = response.content_type() {
            return explicit;
        }
        self.mime.lookup(request_path.unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Cookie, StatusCode};
    use std::time::{Duration, UNIX_EPOCH};

    fn builder() -> ResponseBuilder {
        ResponseBuilder::new("NinjaServer/0.1", Arc::new(MimeTable::default()))
    }

    fn fixed_time() -> SystemTime {
        // Sun, 06 Nov 1994 08:49:37 GMT
        UNIX_EPOCH + Duration::from_secs(784111777)
    }

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_exact_serialization() {
        let response = Response::html("Hello");
        let text = as_text(builder().build_at(&response, Some("/now"), fixed_time()));

        assert_eq!(
            text,
            "HTTP/1.1 200 OK\r\n\
             Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
             Host: NinjaServer/0.1\r\n\
             Content-Length: 5\r\n\
             Connection: Close\r\n\
             Content-Type: text/html; charset=UTF-8\r\n\
             \r\n\
             Hello"
        );
    }

    #[test]
    fn test_content_length_counts_bytes_not_chars() {
        let response = Response::new(StatusCode::Ok).with_body("ñandú");
        let text = as_text(builder().build(&response, Some("/")));

        assert!(text.contains("Content-Length: 7\r\n"));
    }

    #[test]
    fn test_content_type_inferred_from_path() {
        let response = Response::new(StatusCode::Ok).with_body("body{}");
        let text = as_text(builder().build(&response, Some("/style.css")));
        assert!(text.contains("Content-Type: text/css\r\n"));

        let text = as_text(builder().build(&response, Some("/unknown.xyz")));
        assert!(text.contains("Content-Type: application/octet-stream\r\n"));
    }

    #[test]
    fn test_explicit_content_type_skips_inference() {
        let response = Response::new(StatusCode::Ok).with_content_type("text/plain");
        let text = as_text(builder().build(&response, Some("/style.css")));

        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(!text.contains("text/css"));
    }

    #[test]
    fn test_cookies_then_extra_headers() {
        let response = Response::redirect("/welcome")
            .with_cookie(Cookie::new("a", "b"))
            .with_cookie(Cookie::new("username", "TARO").with_max_age(60))
            .with_header("Cache-Control", "no-store");
        let text = as_text(builder().build(&response, Some("/login")));

        let first_cookie = text.find("Set-Cookie: a=b\r\n").unwrap();
        let second_cookie = text.find("Set-Cookie: username=TARO; Max-Age=60\r\n").unwrap();
        let location = text.find("Location: /welcome\r\n").unwrap();
        let cache = text.find("Cache-Control: no-store\r\n").unwrap();
        let content_type = text.find("Content-Type:").unwrap();

        assert!(content_type < first_cookie);
        assert!(first_cookie < second_cookie);
        assert!(second_cookie < location);
        assert!(location < cache);
        assert!(text.starts_with("HTTP/1.1 302 Found\r\n"));
    }

    #[test]
    fn test_binary_body_untouched() {
        let payload = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        let response = Response::new(StatusCode::Ok).with_body_bytes(payload.clone());
        let bytes = builder().build(&response, Some("/logo.png"));

        assert!(bytes.ends_with(&payload));
        let head = String::from_utf8_lossy(&bytes[..bytes.len() - payload.len()]);
        assert!(head.contains("Content-Length: 6\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_empty_body() {
        let response = Response::redirect("/login");
        let text = as_text(builder().build(&response, None));

        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }
}
