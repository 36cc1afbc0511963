//! # Headers
//! src/http/headers.rs
//!
//! Dos mitades del codec de headers:
//! - entrada: el bloque crudo de headers del request → `HashMap`
//! - salida: `HeaderList`, headers extra de la respuesta en orden de inserción

use super::request::ParseError;
use std::collections::HashMap;

/// Parsea el bloque de headers (sin la request line ni el CRLFCRLF final)
///
/// Cada línea se separa en el primer `:`; los espacios que siguen al `:` no
/// forman parte del valor. El nombre se conserva tal como llegó. Si una clave
/// se repite, gana la última (no hay folding).
pub fn parse_header_block(block: &str) -> Result<HashMap<String, String>, ParseError> {
    let mut headers = HashMap::new();

    if block.is_empty() {
        return Ok(headers);
    }

    for line in block.split("\r\n") {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

        if name.is_empty() {
            return Err(ParseError::InvalidHeader(line.to_string()));
        }

        headers.insert(name.to_string(), value.trim_start_matches(' ').to_string());
    }

    Ok(headers)
}

/// Lista ordenada de headers de salida
///
/// Insertar un nombre que ya existe (comparación ASCII case-insensitive)
/// reemplaza el valor y conserva la posición original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_headers() {
        let headers = parse_header_block("Host: localhost:8080\r\nUser-Agent: curl/8.0").unwrap();
        assert_eq!(headers.get("Host"), Some(&"localhost:8080".to_string()));
        assert_eq!(headers.get("User-Agent"), Some(&"curl/8.0".to_string()));
    }

    #[test]
    fn test_parse_without_space_after_colon() {
        let headers = parse_header_block("Accept:*/*").unwrap();
        assert_eq!(headers.get("Accept"), Some(&"*/*".to_string()));
    }

    #[test]
    fn test_parse_value_keeps_later_colons() {
        let headers = parse_header_block("Referer: http://localhost:8080/login").unwrap();
        assert_eq!(
            headers.get("Referer"),
            Some(&"http://localhost:8080/login".to_string())
        );
    }

    #[test]
    fn test_parse_duplicate_last_one_wins() {
        let headers = parse_header_block("X-Id: 1\r\nX-Id: 2").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Id"), Some(&"2".to_string()));
    }

    #[test]
    fn test_parse_keeps_name_case() {
        let headers = parse_header_block("content-length: 3").unwrap();
        assert!(headers.contains_key("content-length"));
        assert!(!headers.contains_key("Content-Length"));
    }

    #[test]
    fn test_parse_line_without_separator_fails() {
        let result = parse_header_block("Host: a\r\nthis is not a header");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_parse_empty_block() {
        assert!(parse_header_block("").unwrap().is_empty());
    }

    #[test]
    fn test_header_list_preserves_insertion_order() {
        let mut list = HeaderList::new();
        list.insert("Location", "/welcome");
        list.insert("X-Frame-Options", "DENY");
        list.insert("Cache-Control", "no-store");

        let names: Vec<&str> = list.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Location", "X-Frame-Options", "Cache-Control"]);
    }

    #[test]
    fn test_header_list_overwrite_keeps_position() {
        let mut list = HeaderList::new();
        list.insert("Location", "/a");
        list.insert("X-Other", "1");
        list.insert("location", "/b");

        assert_eq!(list.len(), 2);
        assert_eq!(list.get("LOCATION"), Some("/b"));
        assert_eq!(list.iter().next(), Some(("Location", "/b")));
    }
}
