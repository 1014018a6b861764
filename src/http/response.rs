//! # Construcción de Respuestas HTTP
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.1
//! de forma programática y escribirlas en el socket.
//!
//! Las respuestas de archivos no cargan el body en memoria: se construye
//! solo la cabecera (con `with_content_length`) y el contenido se envía
//! después en streaming desde `server::files`.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 206 Partial Content\r\n
//! Content-Type: text/plain; charset=utf-8\r\n
//! Content-Length: 3\r\n
//! Content-Range: bytes 2-4/10\r\n
//! Accept-Ranges: bytes\r\n
//! \r\n
//! cde
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use static_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"status":"ok"}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::io::{self, Write};

/// Representa una respuesta HTTP/1.1
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en orden de inserción (sin duplicados)
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (vacío para respuestas de archivo)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se sobrescribe conservando su posición.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo desde un string y calcula `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes y calcula `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        let length = body.len() as u64;
        self.body = body;
        self.with_content_length(length)
    }

    /// Declara `Content-Length` sin adjuntar body
    ///
    /// Se usa cuando el contenido se envía aparte (streaming o caché).
    pub fn with_content_length(self, length: u64) -> Self {
        self.with_header("Content-Length", &length.to_string())
    }

    /// Agrega `Connection: keep-alive` cuando el cliente lo pidió
    pub fn with_keep_alive(self, keep_alive: bool) -> Self {
        if keep_alive {
            self.with_header("Connection", "keep-alive")
        } else {
            self
        }
    }

    /// Crea una respuesta JSON exitosa (200 OK)
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Crea una respuesta de error con un body de texto corto
    ///
    /// El body es la status line legible, ej: `404 Not Found`.
    pub fn error(status: StatusCode) -> Self {
        let body = format!("{}\n", status);
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(&body)
    }

    /// 301 hacia `location`, sin body
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::MovedPermanently)
            .with_header("Location", location)
            .with_content_length(0)
    }

    /// 304 sin body
    pub fn not_modified() -> Self {
        Self::new(StatusCode::NotModified)
    }

    /// 405 con el header `Allow` requerido
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::MethodNotAllowed)
            .with_header("Allow", "GET, HEAD")
            .with_content_length(0)
    }

    /// Serializa solo la status line y los headers (termina en `\r\n\r\n`)
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128);

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");
        result
    }

    /// Convierte la respuesta completa (head + body) a bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Escribe la respuesta en `out` y retorna los bytes escritos
    ///
    /// Con `include_body == false` (HEAD) solo se envía la cabecera,
    /// manteniendo el `Content-Length` original.
    pub fn write_to<W: Write>(&self, out: &mut W, include_body: bool) -> io::Result<u64> {
        let bytes = if include_body {
            self.to_bytes()
        } else {
            self.head_bytes()
        };
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(bytes.len() as u64)
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene el valor de un header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.header("Content-Length").is_none());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_header_overwrites_in_place() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_header("X-Custom", "value")
            .with_header("content-type", "text/html");

        assert_eq!(response.header("Content-Type"), Some("text/html"));
        let text = String::from_utf8(response.head_bytes()).unwrap();
        assert!(text.find("Content-Type").unwrap() < text.find("X-Custom").unwrap());
    }

    #[test]
    fn test_with_body() {
        let response = Response::new(StatusCode::Ok).with_body("Hello World");

        assert_eq!(response.body(), b"Hello World");
        assert_eq!(response.header("Content-Length"), Some("11"));
    }

    #[test]
    fn test_content_length_without_body() {
        let response = Response::new(StatusCode::Ok).with_content_length(4096);
        assert_eq!(response.header("Content-Length"), Some("4096"));
        assert!(response.to_bytes().ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn test_keep_alive_header() {
        let with = Response::new(StatusCode::Ok).with_keep_alive(true);
        let without = Response::new(StatusCode::Ok).with_keep_alive(false);
        assert_eq!(with.header("Connection"), Some("keep-alive"));
        assert!(without.header("Connection").is_none());
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(r#"{"status":"ok"}"#);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body(), br#"{"status":"ok"}"#);
    }

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::NotFound);
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body(), b"404 Not Found\n");
    }

    #[test]
    fn test_redirect_and_method_not_allowed() {
        let redirect = Response::redirect("/docs/");
        assert_eq!(redirect.status(), StatusCode::MovedPermanently);
        assert_eq!(redirect.header("Location"), Some("/docs/"));

        let not_allowed = Response::method_not_allowed();
        assert_eq!(not_allowed.header("Allow"), Some("GET, HEAD"));
        assert_eq!(not_allowed.header("Content-Length"), Some("0"));
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_write_to_head_only() {
        let response = Response::error(StatusCode::Forbidden);
        let mut out = Vec::new();

        let written = response.write_to(&mut out, false).unwrap();

        assert_eq!(written as usize, out.len());
        assert!(out.ends_with(b"\r\n\r\n"));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Content-Length: 14\r\n"));
        assert!(!text.contains("403 Forbidden\n"));
    }
}
