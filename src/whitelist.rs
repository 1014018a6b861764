//! # Whitelist de IPs y Archivos
//! src/whitelist.rs
//!
//! Con la whitelist habilitada:
//! - una IP que no coincide con ninguna entrada recibe 403 antes de parsear
//!   el request;
//! - un path que no coincide recibe 403 antes de resolverse.
//!
//! Una lista vacía no restringe nada.
//!
//! Entradas de IP: dirección IPv4 exacta (`10.0.0.7`) o rango CIDR
//! (`192.168.1.0/24`). Entradas de archivo: path exacto (`/index.html`) o
//! prefijo de directorio terminado en `/` (`/docs/`). El path del request se
//! compara ya decodificado y normalizado; un segmento `..` nunca coincide.

use crate::http::request::url_decode;
use std::net::{IpAddr, Ipv4Addr};

/// Rango IPv4 en forma red/máscara
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ipv4Range {
    network: u32,
    mask: u32,
}

impl Ipv4Range {
    /// Parsea `a.b.c.d` o `a.b.c.d/prefix`
    fn parse(entry: &str) -> Option<Self> {
        let (addr, prefix) = match entry.trim().split_once('/') {
            Some((addr, prefix)) => (addr, prefix.parse::<u32>().ok()?),
            None => (entry.trim(), 32),
        };

        if prefix > 32 {
            return None;
        }

        let network = u32::from(addr.parse::<Ipv4Addr>().ok()?);
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };

        Some(Self { network, mask })
    }

    fn contains(&self, addr: Ipv4Addr) -> bool {
        (u32::from(addr) & self.mask) == (self.network & self.mask)
    }
}

/// Predicado de whitelist construido desde la configuración
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    enabled: bool,
    ips: Vec<Ipv4Range>,
    /// Si hubo entradas pero ninguna era válida, la lista sigue restringiendo
    has_ip_entries: bool,
    files: Vec<String>,
}

impl Whitelist {
    pub fn new(enabled: bool, ips: &[String], files: &[String]) -> Self {
        let ranges = ips
            .iter()
            .filter_map(|entry| {
                let range = Ipv4Range::parse(entry);
                if range.is_none() {
                    log::warn!("whitelist: ignoring invalid IP entry {:?}", entry);
                }
                range
            })
            .collect();

        Self {
            enabled,
            ips: ranges,
            has_ip_entries: !ips.is_empty(),
            files: files.to_vec(),
        }
    }

    /// Whitelist deshabilitada: todo permitido
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// ¿La IP del cliente puede conectarse?
    pub fn ip_allowed(&self, ip: IpAddr) -> bool {
        if !self.enabled || !self.has_ip_entries {
            return true;
        }

        let v4 = match ip {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => v4,
                None => return false,
            },
        };

        self.ips.iter().any(|range| range.contains(v4))
    }

    /// ¿El path del request está permitido?
    ///
    /// Recibe el path tal como llegó; se decodifica y normaliza antes de
    /// compararlo con las entradas.
    pub fn file_allowed(&self, raw_path: &str) -> bool {
        if !self.enabled || self.files.is_empty() {
            return true;
        }

        let path = match normalize_path(raw_path) {
            Some(path) => path,
            None => return false,
        };

        self.files
            .iter()
            .any(|entry| path == *entry || (entry.ends_with('/') && path.starts_with(entry.as_str())))
    }
}

/// Decodifica el path (sin query string) y descarta segmentos vacíos y `.`
///
/// `None` si hay un escape inválido o algún segmento `..`.
fn normalize_path(raw_path: &str) -> Option<String> {
    let path = raw_path.split_once('?').map_or(raw_path, |(path, _)| path);
    let decoded = url_decode(path)?;

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => segments.push(segment),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if !segments.is_empty() && (decoded.ends_with('/') || decoded.ends_with("/.")) {
        normalized.push('/');
    }
    Some(normalized)
}
