//! # Access Log
//! src/access_log.rs
//!
//! Una línea por respuesta en formato Apache "combined":
//!
//! ```text
//! 127.0.0.1 - - [21/Oct/2015:07:28:00 +0000] "GET /index.html HTTP/1.1" 200 1043 "-" "curl/8.0"
//! ```
//!
//! Con el access log deshabilitado, `record` no hace nada.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::Path;

/// Datos de una línea del access log
#[derive(Debug, Clone)]
pub struct AccessRecord<'a> {
    pub client_ip: IpAddr,
    pub method: &'a str,
    pub path: &'a str,
    pub protocol: &'a str,
    pub status: u16,
    pub bytes: u64,
    pub referer: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

impl AccessRecord<'_> {
    /// Formatea la línea (sin salto final) con el timestamp dado
    pub fn format_line(&self, timestamp: DateTime<Local>) -> String {
        format!(
            "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
            self.client_ip,
            timestamp.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.protocol,
            self.status,
            self.bytes,
            self.referer.unwrap_or("-"),
            self.user_agent.unwrap_or("-"),
        )
    }
}

/// Sink del access log, compartido por todos los workers
pub struct AccessLog {
    file: Option<Mutex<File>>,
}

impl AccessLog {
    /// Access log deshabilitado
    pub fn disabled() -> Self {
        Self { file: None }
    }

    /// Abre (o crea) el archivo en modo append, creando directorios padre
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("Access log initialized: {}", path.display());

        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Escribe una línea. Un error de escritura se reporta en el log de la
    /// aplicación pero no afecta la respuesta ya enviada.
    pub fn record(&self, record: &AccessRecord<'_>) {
        let Some(file) = &self.file else {
            return;
        };

        let line = record.format_line(Local::now());
        let mut file = file.lock();
        if let Err(e) = writeln!(file, "{}", line) {
            log::warn!("access log write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    fn sample() -> AccessRecord<'static> {
        AccessRecord {
            client_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            method: "GET",
            path: "/index.html",
            protocol: "HTTP/1.1",
            status: 200,
            bytes: 1043,
            referer: None,
            user_agent: Some("curl/8.0"),
        }
    }

    #[test]
    fn test_format_line() {
        let timestamp = Local.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let line = sample().format_line(timestamp);

        assert!(line.starts_with("127.0.0.1 - - [21/Oct/2015:07:28:00 "));
        assert!(line.ends_with("] \"GET /index.html HTTP/1.1\" 200 1043 \"-\" \"curl/8.0\""));
    }

    #[test]
    fn test_disabled_log_is_noop() {
        let log = AccessLog::disabled();
        assert!(!log.is_enabled());
        log.record(&sample());
    }

    #[test]
    fn test_open_creates_directories_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log").join("access.log");

        let log = AccessLog::open(&path).unwrap();
        assert!(log.is_enabled());
        log.record(&sample());
        log.record(&AccessRecord { status: 404, ..sample() });

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\" 200 1043 "));
        assert!(lines[1].contains("\" 404 1043 "));
    }
}
