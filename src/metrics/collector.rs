//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real. Todos los
//! workers registran aquí cada request, así que los contadores viven detrás
//! de un `Mutex`.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
struct MetricsData {
    /// Contador total de requests
    total_requests: u64,

    /// Bytes escritos en sockets (headers + body)
    total_bytes: u64,

    /// Suma de tiempos de respuesta en milisegundos
    total_response_time_ms: f64,

    min_response_time_ms: f64,
    max_response_time_ms: f64,

    /// Memoria residente pico del proceso, en KiB
    peak_memory_kb: u64,

    /// Tiempo de CPU (usuario + sistema) en milisegundos
    cpu_time_ms: f64,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                total_requests: 0,
                total_bytes: 0,
                total_response_time_ms: 0.0,
                min_response_time_ms: f64::MAX,
                max_response_time_ms: 0.0,
                peak_memory_kb: 0,
                cpu_time_ms: 0.0,
            })),
            start_time: Instant::now(),
        }
    }

    /// Registra un request terminado
    pub fn record_request(&self, bytes_sent: u64, elapsed_ms: f64) {
        let mut data = self.inner.lock();

        data.total_requests += 1;
        data.total_bytes += bytes_sent;
        data.total_response_time_ms += elapsed_ms;

        if elapsed_ms < data.min_response_time_ms {
            data.min_response_time_ms = elapsed_ms;
        }
        if elapsed_ms > data.max_response_time_ms {
            data.max_response_time_ms = elapsed_ms;
        }
    }

    /// Actualiza memoria pico y tiempo de CPU desde `getrusage`
    pub fn update_process_usage(&self) {
        let Some(usage) = process_usage() else {
            return;
        };

        let mut data = self.inner.lock();
        if usage.peak_memory_kb > data.peak_memory_kb {
            data.peak_memory_kb = usage.peak_memory_kb;
        }
        data.cpu_time_ms = usage.cpu_time_ms;
    }

    /// Segundos desde que se creó el collector
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Obtiene un snapshot de las métricas
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let data = self.inner.lock();
        let has_requests = data.total_requests > 0;

        MetricsSnapshot {
            total_requests: data.total_requests,
            total_bytes: data.total_bytes,
            uptime_secs: self.uptime_secs(),
            avg_response_time_ms: if has_requests {
                data.total_response_time_ms / data.total_requests as f64
            } else {
                0.0
            },
            min_response_time_ms: if has_requests { data.min_response_time_ms } else { 0.0 },
            max_response_time_ms: data.max_response_time_ms,
            peak_memory_kb: data.peak_memory_kb,
            cpu_time_ms: data.cpu_time_ms,
        }
    }

    /// Cuerpo JSON del endpoint `/health` (y `/status`)
    ///
    /// El orden de los campos es fijo:
    /// `status, uptime, requests, bytes_served, avg_response_time_ms,
    /// peak_memory_kb, cpu_time_ms`.
    pub fn health_json(&self) -> String {
        self.update_process_usage();
        let snapshot = self.get_snapshot();

        let report = HealthReport {
            status: "ok",
            uptime: snapshot.uptime_secs,
            requests: snapshot.total_requests,
            bytes_served: snapshot.total_bytes,
            avg_response_time_ms: round2(snapshot.avg_response_time_ms),
            peak_memory_kb: snapshot.peak_memory_kb,
            cpu_time_ms: round2(snapshot.cpu_time_ms),
        };

        // Serializar un struct con campos primitivos no puede fallar
        serde_json::to_string(&report).unwrap_or_else(|_| r#"{"status":"ok"}"#.to_string())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_bytes: u64,
    pub uptime_secs: u64,
    pub avg_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub peak_memory_kb: u64,
    pub cpu_time_ms: f64,
}

#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    uptime: u64,
    requests: u64,
    bytes_served: u64,
    avg_response_time_ms: f64,
    peak_memory_kb: u64,
    cpu_time_ms: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

struct ProcessUsage {
    peak_memory_kb: u64,
    cpu_time_ms: f64,
}

#[cfg(unix)]
fn process_usage() -> Option<ProcessUsage> {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: `usage` es un rusage válido y getrusage solo escribe en él
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
        return None;
    }

    let millis = |tv: libc::timeval| tv.tv_sec as f64 * 1000.0 + tv.tv_usec as f64 / 1000.0;

    // ru_maxrss viene en KiB en Linux y en bytes en macOS
    let max_rss = usage.ru_maxrss.max(0) as u64;
    let peak_memory_kb = if cfg!(target_os = "macos") { max_rss / 1024 } else { max_rss };

    Some(ProcessUsage {
        peak_memory_kb,
        cpu_time_ms: millis(usage.ru_utime) + millis(usage.ru_stime),
    })
}

#[cfg(not(unix))]
fn process_usage() -> Option<ProcessUsage> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_metrics_collector() {
        let collector = MetricsCollector::new();

        collector.record_request(100, 10.0);
        collector.record_request(200, 20.0);
        collector.record_request(300, 30.0);

        let snapshot = collector.get_snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.total_bytes, 600);
        assert!((snapshot.avg_response_time_ms - 20.0).abs() < f64::EPSILON);
        assert!((snapshot.min_response_time_ms - 10.0).abs() < f64::EPSILON);
        assert!((snapshot.max_response_time_ms - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsCollector::new().get_snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.avg_response_time_ms, 0.0);
        assert_eq!(snapshot.min_response_time_ms, 0.0);
    }

    #[test]
    fn test_clones_share_counters() {
        let collector = MetricsCollector::new();
        let clone = collector.clone();

        clone.record_request(10, 1.0);
        assert_eq!(collector.get_snapshot().total_requests, 1);
    }

    #[test]
    fn test_concurrent_recording() {
        let collector = MetricsCollector::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let collector = collector.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        collector.record_request(1, 0.5);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = collector.get_snapshot();
        assert_eq!(snapshot.total_requests, 8000);
        assert_eq!(snapshot.total_bytes, 8000);
    }

    #[test]
    fn test_health_json_field_order() {
        let collector = MetricsCollector::new();
        collector.record_request(512, 1.234);

        let json = collector.health_json();

        assert!(json.starts_with(r#"{"status":"ok","uptime":"#));
        let keys = [
            "\"status\"",
            "\"uptime\"",
            "\"requests\"",
            "\"bytes_served\"",
            "\"avg_response_time_ms\"",
            "\"peak_memory_kb\"",
            "\"cpu_time_ms\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|key| json.find(key).unwrap()).collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(json.contains(r#""requests":1"#));
        assert!(json.contains(r#""bytes_served":512"#));
        assert!(json.contains(r#""avg_response_time_ms":1.23"#));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_process_usage_reports_memory() {
        let collector = MetricsCollector::new();
        collector.update_process_usage();
        assert!(collector.get_snapshot().peak_memory_kb > 0);
    }

    #[test]
    fn test_uptime_increases() {
        let collector = MetricsCollector::new();

        let snapshot1 = collector.get_snapshot();
        std::thread::sleep(Duration::from_millis(100));
        let snapshot2 = collector.get_snapshot();

        assert!(snapshot2.uptime_secs >= snapshot1.uptime_secs);
    }
}
