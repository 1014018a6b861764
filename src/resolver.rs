//! # Resolución de Paths
//! src/resolver.rs
//!
//! Convierte el path de un request en un archivo dentro del directorio de
//! contenido, en una redirección o en un rechazo (403/404).
//!
//! ## Modos
//!
//! - **Extensión visible**: las URLs canónicas llevan `.html`. `/` redirige
//!   a `/index.html`, un directorio sin `/` final redirige a la forma con
//!   `/`, y un path sin extensión que no existe prueba con `.html`.
//! - **Extensión oculta**: las URLs canónicas no llevan `.html`. `/` sirve
//!   `index.html`, `/about` sirve `about.html` (o `about/index.html`) y
//!   `/docs.html` redirige a `/docs/` si existe `docs/index.html`.
//!
//! En ambos modos el candidato final se canonicaliza y debe quedar dentro
//! del directorio raíz canonicalizado; si no se puede canonicalizar (por
//! ejemplo porque no existe) o queda afuera, 403.

use crate::http::request::url_decode;
use crate::http::StatusCode;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Caracteres que se escapan al construir un header `Location`
const LOCATION_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const INDEX_FILE: &str = "index.html";

/// Archivo validado listo para servirse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Path canónico, siempre dentro del directorio raíz
    pub path: PathBuf,
    /// Path de URL que termina en el nombre real del archivo (para el MIME)
    pub logical_path: String,
}

/// Resultado de resolver un path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Serve(ResolvedTarget),
    /// 301 hacia este `Location`
    Redirect(String),
    /// 403 o 404
    Reject(StatusCode),
}

/// Resolver de paths para un directorio raíz y un modo de extensión
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: Arc<Path>,
    show_extension: bool,
}

impl PathResolver {
    /// Canonicaliza `root` y construye el resolver
    pub fn new(root: &Path, show_extension: bool) -> io::Result<Self> {
        let canonical = root.canonicalize()?;
        Ok(Self::from_canonical(Arc::from(canonical), show_extension))
    }

    /// Construye el resolver desde un root ya canonicalizado
    pub fn from_canonical(root: Arc<Path>, show_extension: bool) -> Self {
        Self { root, show_extension }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve el path tal como llegó en la línea de request
    pub fn resolve(&self, raw_path: &str) -> Resolution {
        // Antes de decodificar; la canonicalización cubre `%2e%2e`
        if raw_path.contains("..") {
            return Resolution::Reject(StatusCode::Forbidden);
        }

        let raw_path = raw_path.split_once('?').map_or(raw_path, |(path, _)| path);

        let path = match url_decode(raw_path) {
            Some(path) if path.starts_with('/') => path,
            _ => return Resolution::Reject(StatusCode::NotFound),
        };

        if self.show_extension {
            self.resolve_visible(&path)
        } else {
            self.resolve_hidden(&path)
        }
    }

    fn resolve_visible(&self, path: &str) -> Resolution {
        if path == "/" {
            return redirect("/index.html");
        }

        let candidate = self.join(path);

        if candidate.is_dir() {
            if !path.ends_with('/') {
                return redirect(&format!("{}/", path));
            }
            let index = candidate.join(INDEX_FILE);
            if !index.is_file() {
                return Resolution::Reject(StatusCode::NotFound);
            }
            return self.finish(&index, format!("{}{}", path, INDEX_FILE));
        }

        if candidate.is_file() {
            return self.finish(&candidate, path.to_string());
        }

        if !has_extension(path) {
            let logical = format!("{}.html", path);
            let alternative = self.join(&logical);
            if alternative.is_file() {
                return self.finish(&alternative, logical);
            }
        }

        Resolution::Reject(StatusCode::NotFound)
    }

    fn resolve_hidden(&self, path: &str) -> Resolution {
        if path == "/" {
            return self.finish(&self.root.join(INDEX_FILE), "/index.html".to_string());
        }

        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };

        if let Some(base) = path.strip_suffix(".html") {
            if self.join(path).is_file() {
                let clean = if base.ends_with('/') || base.is_empty() {
                    format!("{}/", base.trim_end_matches('/'))
                } else {
                    format!("{}/", base)
                };
                if self.join(&clean).join(INDEX_FILE).is_file() {
                    return redirect(&clean);
                }
            }
        }

        let logical = if has_extension(path) {
            path.to_string()
        } else {
            let with_html = format!("{}.html", path);
            let directory_index = format!("{}/{}", path, INDEX_FILE);
            if !self.join(&with_html).exists() && self.join(&directory_index).is_file() {
                directory_index
            } else {
                with_html
            }
        };

        self.finish(&self.join(&logical), logical)
    }

    /// Canonicaliza el candidato y verifica que siga dentro del root
    ///
    /// Si el candidato no se puede canonicalizar (incluido que no exista)
    /// la respuesta es 403.
    fn finish(&self, candidate: &Path, logical_path: String) -> Resolution {
        let canonical = match candidate.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                log::debug!("resolver: cannot canonicalize {}: {}", candidate.display(), e);
                return Resolution::Reject(StatusCode::Forbidden);
            }
        };

        // `Path::starts_with` compara por componentes
        if !canonical.starts_with(&*self.root) {
            log::info!(
                "resolver: {} escapes content root, rejecting",
                candidate.display()
            );
            return Resolution::Reject(StatusCode::Forbidden);
        }

        match fs::metadata(&canonical) {
            Ok(meta) if meta.is_file() => Resolution::Serve(ResolvedTarget {
                path: canonical,
                logical_path,
            }),
            _ => Resolution::Reject(StatusCode::NotFound),
        }
    }

    /// Une un path de URL al root sin permitir que reemplace al root
    fn join(&self, url_path: &str) -> PathBuf {
        self.root.join(url_path.trim_start_matches('/'))
    }
}

/// ¿El último segmento del path tiene un punto?
fn has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

fn redirect(location: &str) -> Resolution {
    Resolution::Redirect(utf8_percent_encode(location, LOCATION_ENCODE_SET).to_string())
}
