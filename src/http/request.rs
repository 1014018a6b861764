//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser mínimo: lee un único bloque de hasta 16 KiB y extrae solo lo que
//! el servidor de archivos necesita. No se construye un mapa de headers.
//!
//! ## Formato de un Request
//!
//! ```text
//! GET /docs/guide HTTP/1.1\r\n
//! Connection: keep-alive\r\n
//! If-Modified-Since: Wed, 21 Oct 2015 07:28:00 GMT\r\n
//! Range: bytes=0-99\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: solo se usan los dos primeros tokens (método y path);
//!    la versión se ignora.
//! 2. **Headers**: se buscan por nombre al inicio de cada línea del bloque de
//!    headers (`Connection`, `If-Modified-Since`, `Range`, `Referer`,
//!    `User-Agent`). Lo que venga después de la línea vacía nunca se examina.

use chrono::NaiveDateTime;
use percent_encoding::percent_decode_str;
use std::time::SystemTime;

/// Máximo de bytes leídos del socket por request
pub const MAX_REQUEST_SIZE: usize = 16 * 1024;

/// Formato fijo de fecha HTTP: `Wed, 21 Oct 2015 07:28:00 GMT`
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es GET ni HEAD
    pub fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request vacío (solo espacios)
    EmptyRequest,

    /// La primera línea no tiene método y path
    InvalidRequestLine,

    /// Método HTTP no soportado
    UnsupportedMethod(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::EmptyRequest => write!(f, "Empty request"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
        }
    }
}

impl std::error::Error for ParseError {}

/// Rango de bytes tal como lo pidió el cliente (`bytes=<start>-[<end>]`)
///
/// Se valida contra el tamaño del archivo recién cuando se conoce, con
/// [`RangeSpec::bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeSpec {
    /// Parsea el valor del header `Range`
    ///
    /// Acepta exactamente `bytes=<start>-<end>` o `bytes=<start>-`.
    /// Cualquier otra forma (sufijos, múltiples rangos) retorna `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let ranges = value.trim().strip_prefix("bytes=")?;
        let (start, end) = ranges.split_once('-')?;

        let start = parse_digits(start)?;
        let end = if end.is_empty() {
            None
        } else {
            Some(parse_digits(end)?)
        };

        Some(Self { start, end })
    }

    /// Resuelve el rango contra el tamaño del archivo
    ///
    /// Retorna `(start, end)` inclusivo, o `None` si el rango está fuera de
    /// límites, lo que equivale a no haber pedido rango.
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::request::RangeSpec;
    ///
    /// let range = RangeSpec::parse("bytes=2-").unwrap();
    /// assert_eq!(range.bounds(10), Some((2, 9)));
    /// assert_eq!(range.bounds(2), None);
    /// ```
    pub fn bounds(&self, file_size: u64) -> Option<(u64, u64)> {
        let end = match self.end {
            Some(end) => end,
            None => file_size.checked_sub(1)?,
        };

        if self.start >= file_size || end < self.start || end >= file_size {
            return None;
        }

        Some((self.start, end))
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Representa un request parseado
///
/// Se construye una vez por request y no se modifica después.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    /// Token del método tal como llegó (ej: "GET", "POST")
    method: String,

    /// Path sin decodificar, como aparece en la request line
    raw_path: String,

    /// Path decodificado; `None` si tenía un escape `%XX` inválido
    decoded_path: Option<String>,

    /// `Connection: keep-alive` presente
    keep_alive: bool,

    /// Valor de `If-Modified-Since` si tenía el formato de fecha HTTP
    if_modified_since: Option<SystemTime>,

    /// Valor de `Range` si era sintácticamente válido
    range: Option<RangeSpec>,

    referer: Option<String>,
    user_agent: Option<String>,
}

impl ParsedRequest {
    /// Parsea un request desde el buffer leído del socket
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_server::http::ParsedRequest;
    ///
    /// let raw = b"GET /about%20us HTTP/1.1\r\nConnection: keep-alive\r\n\r\n";
    /// let request = ParsedRequest::parse(raw).unwrap();
    ///
    /// assert_eq!(request.raw_path(), "/about%20us");
    /// assert_eq!(request.decoded_path(), Some("/about us"));
    /// assert!(request.keep_alive());
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(buffer);

        if text.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // Solo el bloque de headers; lo que sigue a la línea vacía se ignora
        let head = match text.find("\r\n\r\n") {
            Some(pos) => &text[..pos],
            None => &text[..],
        };

        // 1. Request line: método y path
        let mut tokens = head.lines().next().unwrap_or("").split_whitespace();
        let (method, raw_path) = match (tokens.next(), tokens.next()) {
            (Some(method), Some(path)) => (method.to_string(), path.to_string()),
            _ => return Err(ParseError::InvalidRequestLine),
        };

        // 2. Headers puntuales
        let keep_alive = header_value(head, "Connection")
            .map(|value| {
                value
                    .split(',')
                    .any(|token| token.trim().eq_ignore_ascii_case("keep-alive"))
            })
            .unwrap_or(false);

        let if_modified_since = header_value(head, "If-Modified-Since").and_then(parse_http_date);
        let range = header_value(head, "Range").and_then(RangeSpec::parse);

        Ok(ParsedRequest {
            decoded_path: url_decode(&raw_path),
            method,
            raw_path,
            keep_alive,
            if_modified_since,
            range,
            referer: header_value(head, "Referer").map(str::to_string),
            user_agent: header_value(head, "User-Agent").map(str::to_string),
        })
    }

    // === Métodos públicos para acceder a los campos ===

    /// Método validado; error si no es GET ni HEAD
    pub fn method(&self) -> Result<Method, ParseError> {
        Method::from_str(&self.method)
    }

    /// Token del método sin validar (para el access log)
    pub fn method_token(&self) -> &str {
        &self.method
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn decoded_path(&self) -> Option<&str> {
        self.decoded_path.as_deref()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn if_modified_since(&self) -> Option<SystemTime> {
        self.if_modified_since
    }

    pub fn range(&self) -> Option<RangeSpec> {
        self.range
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Busca un header por nombre (case-insensitive) en el bloque de headers
///
/// Recorre las líneas después de la request line y se detiene en la
/// primera línea vacía.
fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(header, _)| header.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

/// Parsea una fecha HTTP en formato fijo (`Wed, 21 Oct 2015 07:28:00 GMT`)
///
/// Cualquier otro formato retorna `None` y el header se ignora.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| SystemTime::from(naive.and_utc()))
}

/// Decodifica un path de URL (`%XX` y `+` como espacio)
///
/// Retorna `None` si hay un escape malformado o si el resultado no es UTF-8.
///
/// # Ejemplo
/// ```
/// use static_server::http::request::url_decode;
///
/// assert_eq!(url_decode("/a%20b+c").as_deref(), Some("/a b c"));
/// assert_eq!(url_decode("/bad%2"), None);
/// ```
pub fn url_decode(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
        }
    }

    let plus_as_space = path.replace('+', " ");
    percent_decode_str(&plus_as_space)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
