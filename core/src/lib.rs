//! Core utilities and shared types for the exporter.

pub mod error;
pub mod limiter;

pub use error::{HostListReadError, MetricsRenderError, ScanExecutionError};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// A host identifier as it appears in the host list: IPv4, IPv6 or hostname.
/// Not validated; it is handed to the scanner verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(pub String);

impl Target {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target(s)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
