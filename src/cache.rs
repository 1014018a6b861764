//! # Caché de Archivos en Memoria
//! src/cache.rs
//!
//! Caché acotada (32 entradas, 64 KiB por archivo) indexada por path
//! canónico. Cada lookup vuelve a hacer `stat` del archivo: si el mtime
//! cambió, la entrada se descarta y se trata como miss.
//!
//! Todos los workers comparten la misma instancia, así que el mapa vive
//! detrás de un `Mutex`. Los bytes se guardan en un `Arc<[u8]>` para que el
//! lock no se mantenga mientras se escribe la respuesta en el socket.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Máximo de entradas simultáneas
pub const CACHE_MAX_ENTRIES: usize = 32;

/// Tamaño máximo de un archivo cacheable
pub const CACHE_MAX_FILE_SIZE: usize = 64 * 1024;

/// Vista de solo lectura de una entrada, entregada en cada hit
#[derive(Debug, Clone)]
pub struct CachedFile {
    pub data: Arc<[u8]>,
    pub mime_type: &'static str,
}

impl CachedFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

struct CacheEntry {
    data: Arc<[u8]>,
    mime_type: &'static str,
    /// mtime del archivo al momento de cachearlo
    mtime: SystemTime,
    last_access: Instant,
}

/// Caché LRU thread-safe
pub struct FileCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    max_entries: usize,
    max_file_size: usize,
}

impl FileCache {
    /// Crea una caché con los límites por defecto (32 entradas, 64 KiB)
    pub fn new() -> Self {
        Self::with_limits(CACHE_MAX_ENTRIES, CACHE_MAX_FILE_SIZE)
    }

    pub fn with_limits(max_entries: usize, max_file_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(max_entries)),
            max_entries,
            max_file_size,
        }
    }

    /// Busca un archivo en la caché
    ///
    /// Un hit actualiza el instante de último acceso. Si el archivo en disco
    /// ya no tiene el mismo mtime (o desapareció), la entrada se elimina y se
    /// retorna `None`.
    pub fn lookup(&self, path: &Path) -> Option<CachedFile> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(path)?;

        let current_mtime = fs::metadata(path).and_then(|meta| meta.modified()).ok();
        if current_mtime != Some(entry.mtime) {
            log::debug!("cache: entrada obsoleta para {}", path.display());
            entries.remove(path);
            return None;
        }

        entry.last_access = Instant::now();
        Some(CachedFile {
            data: Arc::clone(&entry.data),
            mime_type: entry.mime_type,
        })
    }

    /// Inserta una copia privada de `data`
    ///
    /// No hace nada si el path ya está cacheado o si `data` supera el límite
    /// por archivo. Con la caché llena, desaloja la entrada con el último
    /// acceso más antiguo.
    pub fn insert(&self, path: &Path, data: &[u8], mime_type: &'static str, mtime: SystemTime) {
        if data.len() > self.max_file_size || self.max_entries == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        if entries.contains_key(path) {
            return;
        }

        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                log::debug!("cache: desalojando {}", oldest.display());
                entries.remove(&oldest);
            }
        }

        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                data: Arc::from(data),
                mime_type,
                mtime,
                last_access: Instant::now(),
            },
        );
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Límite por archivo (los archivos más grandes se envían en streaming)
    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}
