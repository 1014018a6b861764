//! # Módulo HTTP
//!
//! Subconjunto de HTTP/1.1 que necesita un servidor de archivos estáticos,
//! implementado sin librerías de alto nivel:
//!
//! - Parsing mínimo de requests (método, path y unos pocos headers)
//! - Construcción de responses
//! - Códigos de estado
//! - Tabla de tipos MIME
//!
//! ### Formato de Request
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Connection: keep-alive\r\n
//! Range: bytes=0-99\r\n
//! \r\n
//! ```

pub mod mime;      // Content-Type por extensión
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{Method, ParseError, ParsedRequest};
pub use response::Response;
pub use status::StatusCode;
