//! Periodic scan cycles: reload hosts, dispatch one nmap per host, stamp the cycle.

use crate::config::Config;
use exporter_core::limiter::ScanLimiter;
use exporter_core::{HostListReadError, Target};
use metrics_registry::MetricsRegistry;
use nmap_scan::ScanCommand;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct Scheduler {
    hosts_file: PathBuf,
    command: Arc<ScanCommand>,
    registry: Arc<MetricsRegistry>,
    limiter: ScanLimiter,
    interval: Duration,
    await_scans: bool,
}

/// Scans started by one cycle. Dropping this detaches them; they keep running.
#[derive(Debug)]
pub struct Dispatch {
    hosts: usize,
    handles: Vec<JoinHandle<()>>,
}

impl Dispatch {
    pub fn hosts(&self) -> usize {
        self.hosts
    }

    /// Wait for every scan still attached to this dispatch.
    pub async fn wait(&mut self) {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "scan task ended abnormally");
            }
        }
    }
}

impl Scheduler {
    pub fn new(hosts_file: impl Into<PathBuf>, command: ScanCommand, registry: Arc<MetricsRegistry>) -> Self {
        Scheduler {
            hosts_file: hosts_file.into(),
            command: Arc::new(command),
            registry,
            limiter: ScanLimiter::unbounded(),
            interval: Duration::from_secs(24 * 60 * 60),
            await_scans: false,
        }
    }

    pub fn from_config(config: &Config, registry: Arc<MetricsRegistry>) -> Self {
        Scheduler::new(config.hosts_file.clone(), config.scan_command(), registry)
            .with_interval(config.interval())
            .with_limiter(ScanLimiter::new(config.max_concurrent_scans))
            .await_scans(config.await_scans)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_limiter(mut self, limiter: ScanLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn await_scans(mut self, yes: bool) -> Self {
        self.await_scans = yes;
        self
    }

    /// Run a cycle now and then once per interval, forever. Ticks follow the
    /// fixed period, not cycle completion.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(dispatch) => debug!(hosts = dispatch.hosts(), "scan cycle dispatched"),
                Err(e) => error!(error = %e, "scan cycle aborted"),
            }
        }
    }

    /// Reload the host list and start one scan per host.
    ///
    /// The timestamp is set as soon as every scan has been dispatched, unless
    /// `await_scans` is on, in which case it waits for all of them first. A
    /// host list failure returns before anything is scanned or stamped.
    pub async fn run_cycle(&self) -> Result<Dispatch, HostListReadError> {
        let hosts = host_list::load_hosts(&self.hosts_file).await?;
        info!(hosts = hosts.len(), bounded = self.limiter.is_bounded(), "starting scan cycle");

        let mut dispatch = Dispatch { hosts: hosts.len(), handles: Vec::with_capacity(hosts.len()) };
        for host in hosts {
            dispatch.handles.push(tokio::spawn(scan_host(
                host,
                self.command.clone(),
                self.registry.clone(),
                self.limiter.clone(),
            )));
        }

        if self.await_scans {
            dispatch.wait().await;
        }
        self.registry.set_last_scan_timestamp(now_millis());
        Ok(dispatch)
    }
}

async fn scan_host(host: Target, command: Arc<ScanCommand>, registry: Arc<MetricsRegistry>, limiter: ScanLimiter) {
    let _permit = limiter.acquire().await;
    match command.run(&host).await {
        Ok(out) => {
            debug!(host = %host, open_ports = out.open_ports, "scan finished");
            registry.set_open_ports(&host, out.open_ports);
        }
        Err(e) => error!(host = %host, error = %e, "scan failed, keeping previous sample"),
    }
}

fn now_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
