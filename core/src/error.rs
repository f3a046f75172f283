//! Error taxonomy shared by the loader, the scan runner and the registry.
//! None of these are fatal to the process.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// The host list could not be opened or read. Aborts the current cycle only.
#[derive(Debug, Error)]
#[error("failed to read host list {}: {source}", .path.display())]
pub struct HostListReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A single host's scan did not produce a result. The host keeps its previous sample.
#[derive(Debug, Error)]
pub enum ScanExecutionError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed waiting on {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

/// Serializing the registry failed; reported to the scraper as a 500.
#[derive(Debug, Error)]
#[error("failed to render metrics: {0}")]
pub struct MetricsRenderError(#[from] pub std::fmt::Error);
