//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Tabla cerrada de códigos que el servidor sabe emitir. Al ser un enum,
//! un código desconocido no se puede construir: el error aparece al compilar
//! y no en medio de una conexión.
//!
//! - **2xx**: 200 OK
//! - **3xx**: 302 Found (redirecciones del login)
//! - **4xx**: 400, 404, 405, 413
//! - **5xx**: 500, 503

/// Códigos de estado soportados por el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 302 Found - Redirección temporal (requiere header `Location`)
    Found = 302,

    /// 400 Bad Request - El request no se pudo parsear
    BadRequest = 400,

    /// 404 Not Found - Recurso estático inexistente o inaccesible
    NotFound = 404,

    /// 405 Method Not Allowed - El handler no acepta ese método
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - El request supera el límite configurado
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - Falló un handler o un template
    InternalServerError = 500,

    /// 503 Service Unavailable - Cola de conexiones llena
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use ninja_server::http::StatusCode;
    /// assert_eq!(StatusCode::Found.as_u16(), 302);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Busca un código en la tabla; `None` si no está soportado
    ///
    /// # Ejemplo
    /// ```
    /// use ninja_server::http::StatusCode;
    /// assert_eq!(StatusCode::from_u16(405), Some(StatusCode::MethodNotAllowed));
    /// assert_eq!(StatusCode::from_u16(418), None);
    /// ```
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            302 => Some(StatusCode::Found),
            400 => Some(StatusCode::BadRequest),
            404 => Some(StatusCode::NotFound),
            405 => Some(StatusCode::MethodNotAllowed),
            413 => Some(StatusCode::PayloadTooLarge),
            500 => Some(StatusCode::InternalServerError),
            503 => Some(StatusCode::ServiceUnavailable),
            _ => None,
        }
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Found => "Found",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato de la status line: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
