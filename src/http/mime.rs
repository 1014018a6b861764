//! Tabla fija de tipos MIME por extensión.

use std::path::Path;

/// Tipo por defecto cuando la extensión no está en la tabla
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("txt", "text/plain; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("md", "text/markdown; charset=utf-8"),
    ("ico", "image/x-icon"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("wasm", "application/wasm"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
];

/// Determina el Content-Type a partir de la extensión del path lógico
///
/// # Ejemplo
/// ```
/// use static_server::http::mime::mime_type;
///
/// assert_eq!(mime_type("/index.HTML"), "text/html; charset=utf-8");
/// assert_eq!(mime_type("/bin/data"), "application/octet-stream");
/// ```
pub fn mime_type(path: &str) -> &'static str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(mime_type("/style.css"), "text/css; charset=utf-8");
        assert_eq!(mime_type("/img/logo.png"), "image/png");
        assert_eq!(mime_type("/a/b/c.json"), "application/json");
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(mime_type("/archive.xyz"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type("/README"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type("/"), DEFAULT_MIME_TYPE);
    }
}
