//! In-memory metrics registry rendered in the OpenMetrics text format.

mod open_ports;

use exporter_core::{MetricsRenderError, Target};
use open_ports::OpenPortsGauge;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

pub const OPEN_PORTS_METRIC: &str = "nmap_open_ports_count";
pub const LAST_SCAN_METRIC: &str = "last_scan_timestamp";

/// Content type of [`MetricsRegistry::render`] output.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Registry shared by the scheduler (writer) and the HTTP endpoint (reader).
///
/// Samples are only ever added or overwritten; a host stays in the output for
/// the lifetime of the process once it has been scanned successfully.
#[derive(Debug)]
pub struct MetricsRegistry {
    registry: Registry,
    open_ports: OpenPortsGauge,
    last_scan: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let open_ports = OpenPortsGauge::default();
        let last_scan = Gauge::default();
        registry.register_collector(Box::new(open_ports.clone()));
        registry.register(
            LAST_SCAN_METRIC,
            "UNIX timestamp when the last nmap scan was completed",
            last_scan.clone(),
        );
        MetricsRegistry { registry, open_ports, last_scan }
    }

    /// Upsert the open-port sample for `host`.
    pub fn set_open_ports(&self, host: &Target, count: u64) {
        self.open_ports.set(host.as_str(), i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Overwrite the last-scan timestamp (UNIX epoch milliseconds).
    pub fn set_last_scan_timestamp(&self, epoch_millis: i64) {
        self.last_scan.set(epoch_millis);
    }

    pub fn open_ports(&self, host: &Target) -> Option<i64> {
        self.open_ports.get(host.as_str())
    }

    pub fn last_scan_timestamp(&self) -> i64 {
        self.last_scan.get()
    }

    pub fn known_hosts(&self) -> usize {
        self.open_ports.len()
    }

    /// Serialize every registered metric. Each call is a complete snapshot.
    pub fn render(&self) -> Result<String, MetricsRenderError> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn renders_host_sample() {
        let reg = MetricsRegistry::new();
        reg.set_open_ports(&Target::from("10.0.0.5"), 4);
        let out = reg.render().unwrap();
        assert!(out.contains("# TYPE nmap_open_ports_count gauge"));
        assert!(out.contains("nmap_open_ports_count{ip=\"10.0.0.5\"} 4\n"));
    }

    #[test]
    fn rescan_overwrites_without_duplicates() {
        let reg = MetricsRegistry::new();
        let host = Target::from("10.0.0.5");
        reg.set_open_ports(&host, 4);
        reg.set_open_ports(&host, 0);
        let out = reg.render().unwrap();
        assert_eq!(out.matches("ip=\"10.0.0.5\"").count(), 1);
        assert!(out.contains("nmap_open_ports_count{ip=\"10.0.0.5\"} 0\n"));
        assert_eq!(reg.open_ports(&host), Some(0));
        assert_eq!(reg.known_hosts(), 1);
    }

    #[test]
    fn empty_registry_still_describes_metrics() {
        let reg = MetricsRegistry::new();
        let out = reg.render().unwrap();
        assert!(out.contains("# TYPE nmap_open_ports_count gauge"));
        assert!(out.contains("# TYPE last_scan_timestamp gauge"));
        assert!(out.contains("last_scan_timestamp 0\n"));
        assert!(!out.contains("ip=\""));
        assert!(out.ends_with("# EOF\n"));
    }

    #[test]
    fn timestamp_is_overwritten() {
        let reg = MetricsRegistry::new();
        reg.set_last_scan_timestamp(1_700_000_000_000);
        reg.set_last_scan_timestamp(1_700_000_086_400);
        assert_eq!(reg.last_scan_timestamp(), 1_700_000_086_400);
        let out = reg.render().unwrap();
        assert!(out.contains("last_scan_timestamp 1700000086400\n"));
        assert_eq!(out.matches("\nlast_scan_timestamp ").count(), 1);
    }

    #[test]
    fn quotes_in_host_are_escaped_in_output() {
        let reg = MetricsRegistry::new();
        reg.set_open_ports(&Target::from("bad\"host\\x"), 1);
        let out = reg.render().unwrap();
        assert!(out.contains("nmap_open_ports_count{ip=\"bad\\\"host\\\\x\"} 1\n"));
        assert!(!out.contains("ip=\"bad\"host"));
        assert!(out.ends_with("# EOF\n"));
    }

    #[test]
    fn hosts_render_in_sorted_order() {
        let reg = MetricsRegistry::new();
        for (h, c) in [("10.0.0.9", 1), ("10.0.0.1", 2), ("db.internal", 3)] {
            reg.set_open_ports(&Target::from(h), c);
        }
        let out = reg.render().unwrap();
        let a = out.find("ip=\"10.0.0.1\"").unwrap();
        let b = out.find("ip=\"10.0.0.9\"").unwrap();
        let c = out.find("ip=\"db.internal\"").unwrap();
        assert!(a < b && b < c);
        assert_eq!(out, reg.render().unwrap());
    }

    #[test]
    fn concurrent_renders_are_complete() {
        let reg = Arc::new(MetricsRegistry::new());
        let writer = {
            let reg = reg.clone();
            std::thread::spawn(move || {
                for i in 0..500u64 {
                    reg.set_open_ports(&Target::from(format!("10.0.{}.{}", i / 250, i % 250)), i);
                    reg.set_last_scan_timestamp(i as i64);
                }
            })
        };
        for _ in 0..50 {
            let out = reg.render().unwrap();
            assert!(out.ends_with("# EOF\n"));
            assert_eq!(out.matches("# TYPE nmap_open_ports_count gauge").count(), 1);
        }
        writer.join().unwrap();
        assert_eq!(reg.known_hosts(), 500);
    }
}
