//! # Envío de Archivos
//! src/server/files.rs
//!
//! Arma la respuesta para un archivo ya resuelto:
//!
//! 1. `If-Modified-Since` >= mtime → 304 sin body
//! 2. `Range` válido → 206 con `Content-Range`, sin pasar por la caché
//! 3. GET con hit en caché → 200 desde memoria
//! 4. Archivo chico (≤ 64 KiB) → se lee completo, se cachea y se envía
//! 5. Archivo grande → streaming en bloques de 128 KiB
//!
//! Una falla al abrir el archivo se reporta como `NotFound` porque todavía
//! no se escribió nada. Una falla de escritura aborta la respuesta.

use crate::cache::FileCache;
use crate::http::mime::mime_type;
use crate::http::request::HTTP_DATE_FORMAT;
use crate::http::{ParsedRequest, Response, StatusCode};
use crate::resolver::ResolvedTarget;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Tamaño de bloque para streaming
pub const STREAM_CHUNK_SIZE: usize = 128 * 1024;

#[derive(Debug, Error)]
pub enum ServeError {
    /// El archivo desapareció o no es regular; nada se escribió todavía
    #[error("file not found")]
    NotFound,

    /// Falla de lectura o escritura con la respuesta `status` ya empezada
    #[error("I/O error while sending {status}: {source}")]
    Io {
        status: StatusCode,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// Status de la respuesta que se estaba enviando
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::NotFound => StatusCode::NotFound,
            ServeError::Io { status, .. } => *status,
        }
    }
}

/// Adaptador para `map_err` en las escrituras de una respuesta
pub fn aborted(status: StatusCode) -> impl FnOnce(io::Error) -> ServeError {
    move |source| ServeError::Io { status, source }
}

/// Envía `target` por `out` según el request
///
/// Retorna el status enviado.
pub fn serve_file<W: Write>(
    out: &mut W,
    target: &ResolvedTarget,
    request: &ParsedRequest,
    cache: &FileCache,
) -> Result<StatusCode, ServeError> {
    let meta = match fs::metadata(&target.path) {
        Ok(meta) if meta.is_file() => meta,
        _ => return Err(ServeError::NotFound),
    };
    let mtime = meta.modified().ok();
    let size = meta.len();
    let keep_alive = request.keep_alive();
    let include_body = !request.is_head();

    // 1. Request condicional
    if let (Some(since), Some(mtime)) = (request.if_modified_since(), mtime) {
        if since >= truncate_to_secs(mtime) {
            Response::not_modified()
                .with_keep_alive(keep_alive)
                .write_to(out, false)
                .map_err(aborted(StatusCode::NotModified))?;
            return Ok(StatusCode::NotModified);
        }
    }

    let mime = mime_type(&target.logical_path);

    // 2. Rango de bytes
    if let Some((start, end)) = request.range().and_then(|range| range.bounds(size)) {
        let mut file = File::open(&target.path).map_err(|_| ServeError::NotFound)?;
        let length = end - start + 1;

        let head = file_headers(StatusCode::PartialContent, mime, length, mtime, keep_alive)
            .with_header("Content-Range", &format!("bytes {}-{}/{}", start, end, size));
        head.write_to(out, false).map_err(aborted(StatusCode::PartialContent))?;

        if include_body {
            file.seek(SeekFrom::Start(start))
                .and_then(|_| stream(&mut file, out, length))
                .map_err(aborted(StatusCode::PartialContent))?;
        }
        return Ok(StatusCode::PartialContent);
    }

    // 3. Hit en caché
    if include_body {
        if let Some(cached) = cache.lookup(&target.path) {
            log::debug!("cache hit: {}", target.path.display());
            file_headers(StatusCode::Ok, cached.mime_type, cached.len() as u64, mtime, keep_alive)
                .write_to(out, false)
                .and_then(|_| out.write_all(&cached.data))
                .and_then(|_| out.flush())
                .map_err(aborted(StatusCode::Ok))?;
            return Ok(StatusCode::Ok);
        }
    }

    let mut file = File::open(&target.path).map_err(|_| ServeError::NotFound)?;
    file_headers(StatusCode::Ok, mime, size, mtime, keep_alive)
        .write_to(out, false)
        .map_err(aborted(StatusCode::Ok))?;

    if !include_body {
        return Ok(StatusCode::Ok);
    }

    // 4. Archivo cacheable
    if size > 0 && size <= cache.max_file_size() as u64 {
        let mut buffer = Vec::with_capacity(size as usize);
        match file.read_to_end(&mut buffer) {
            Ok(read) if read as u64 == size => {
                if let Some(mtime) = mtime {
                    cache.insert(&target.path, &buffer, mime, mtime);
                }
                out.write_all(&buffer)
                    .and_then(|_| out.flush())
                    .map_err(aborted(StatusCode::Ok))?;
                return Ok(StatusCode::Ok);
            }
            _ => {
                log::debug!(
                    "buffered read of {} failed, streaming instead",
                    target.path.display()
                );
                file.seek(SeekFrom::Start(0))
                    .map_err(aborted(StatusCode::Ok))?;
            }
        }
    }

    // 5. Streaming
    stream(&mut file, out, size).map_err(aborted(StatusCode::Ok))?;
    Ok(StatusCode::Ok)
}

/// Headers comunes de 200 y 206
fn file_headers(
    status: StatusCode,
    mime: &str,
    length: u64,
    mtime: Option<SystemTime>,
    keep_alive: bool,
) -> Response {
    let mut response = Response::new(status)
        .with_header("Content-Type", mime)
        .with_content_length(length)
        .with_header("Accept-Ranges", "bytes");

    if let Some(mtime) = mtime {
        response.add_header("Last-Modified", &format_http_date(mtime));
    }

    response.with_keep_alive(keep_alive)
}

/// Copia hasta `remaining` bytes en bloques de `STREAM_CHUNK_SIZE`
fn stream<R: Read, W: Write>(reader: &mut R, out: &mut W, mut remaining: u64) -> io::Result<u64> {
    let mut buffer = vec![0u8; STREAM_CHUNK_SIZE.min(remaining as usize)];
    let mut sent = 0;

    while remaining > 0 {
        let want = buffer.len().min(remaining as usize);
        let read = reader.read(&mut buffer[..want])?;
        if read == 0 {
            // El archivo se achicó mientras se enviaba
            break;
        }
        out.write_all(&buffer[..read])?;
        remaining -= read as u64;
        sent += read as u64;
    }

    out.flush()?;
    Ok(sent)
}

/// Las fechas HTTP tienen resolución de segundos
fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => UNIX_EPOCH + std::time::Duration::from_secs(since_epoch.as_secs()),
        Err(_) => time,
    }
}

fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}
