//! # Cookies
//! src/http/cookie.rs
//!
//! Parsing del header `Cookie` entrante y serialización de `Set-Cookie`.
//! Solo se soporta `Max-Age`; no hay `Domain`, `Path` ni `Secure`.
//!
//! ```text
//! Cookie: username=TARO; email=taro@example.com
//! Set-Cookie: username=TARO; Max-Age=60
//! ```

use std::collections::HashMap;

/// Una cookie que el handler quiere enviar al cliente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,

    /// Segundos de vida; `None` = cookie de sesión
    pub max_age: Option<u64>,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Valor del header `Set-Cookie` (sin el nombre del header)
    ///
    /// # Ejemplo
    /// ```
    /// use ninja_server::http::Cookie;
    ///
    /// let cookie = Cookie::new("a", "b").with_max_age(60);
    /// assert_eq!(cookie.to_header_value(), "a=b; Max-Age=60");
    /// ```
    pub fn to_header_value(&self) -> String {
        match self.max_age {
            Some(age) => format!("{}={}; Max-Age={}", self.name, self.value, age),
            None => format!("{}={}", self.name, self.value),
        }
    }
}

/// Parsea el valor de un header `Cookie` en un mapa nombre → valor
///
/// Los pares se separan por `;`. Un par sin `=` se ignora; si un nombre se
/// repite, gana el último.
pub fn parse_cookie_header(value: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for pair in value.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), value.trim().to_string());
        }
    }

    cookies
}
