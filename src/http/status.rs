//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado que produce el servidor de
//! archivos estáticos. Es un subconjunto pequeño de HTTP/1.1:
//!
//! - **2xx**: Éxito (200 OK, 206 Partial Content)
//! - **3xx**: Redirección (301) y validación de caché (304)
//! - **4xx**: Error del cliente (400, 403, 404, 405)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - Archivo completo
    Ok = 200,

    /// 206 Partial Content - Respuesta a un header `Range` válido
    PartialContent = 206,

    /// 301 Moved Permanently - Redirección a la forma canónica de la URL
    MovedPermanently = 301,

    /// 304 Not Modified - `If-Modified-Since` igual o posterior al mtime
    NotModified = 304,

    /// 400 Bad Request - Request line sin método o path
    BadRequest = 400,

    /// 403 Forbidden - Traversal, whitelist o escape del content root
    Forbidden = 403,

    /// 404 Not Found - Archivo inexistente o path inválido
    NotFound = 404,

    /// 405 Method Not Allowed - Cualquier método distinto de GET/HEAD
    MethodNotAllowed = 405,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::PartialContent.as_u16(), 206);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
        }
    }

    /// Verifica si el código indica error del cliente (4xx)
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert!(StatusCode::Forbidden.is_client_error());
    /// assert!(!StatusCode::NotModified.is_client_error());
    /// ```
    pub fn is_client_error(&self) -> bool {
        let code = self.as_u16();
        (400..500).contains(&code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
