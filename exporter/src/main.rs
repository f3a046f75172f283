use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_registry::MetricsRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod logging;
mod scheduler;
mod server;

use scheduler::Scheduler;

#[derive(Debug, Parser)]
#[command(name = "nmap-exporter", version, about = "Scan hosts with nmap and export open-port counts for Prometheus")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./nmap-exporter.yaml if present.
    /// Without a subcommand the exporter scans on schedule and serves /metrics.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(Commands::Version) = cli.command {
        println!("nmap-exporter {} (core {})", env!("CARGO_PKG_VERSION"), exporter_core::version());
        return Ok(());
    }
    let cfg = config::load_config(cli.config.as_deref())?;
    logging::init(&cfg.log);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cfg))
}

async fn run(cfg: config::Config) -> Result<()> {
    let registry = Arc::new(MetricsRegistry::new());
    let listener = TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("binding metrics listener on {}", cfg.listen))?;
    info!(addr = %cfg.listen, hosts_file = %cfg.hosts_file.display(), "serving /metrics");

    tokio::spawn(Scheduler::from_config(&cfg, registry.clone()).run());
    server::serve(listener, registry).await
}
