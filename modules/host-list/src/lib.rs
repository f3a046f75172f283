//! Newline-delimited host list loading.

use exporter_core::{HostListReadError, Target};
use std::path::Path;

/// Split file contents into trimmed, non-empty host entries, keeping file order.
pub fn parse_hosts(contents: &str) -> Vec<Target> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(Target::from)
        .collect()
}

/// Read the host list at `path`. Any open/read failure (including non UTF-8
/// content) is returned so the caller can abort the cycle before scanning.
pub async fn load_hosts(path: &Path) -> Result<Vec<Target>, HostListReadError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HostListReadError { path: path.to_path_buf(), source })?;
    Ok(parse_hosts(&contents))
}
