//! One child process per host; stdout captured as text.

use crate::parse::count_open;
use exporter_core::{ScanExecutionError, Target};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "nmap";

/// SYN scan, skip host discovery, all ports, report open ports only.
pub const DEFAULT_ARGS: &[&str] = &["-sS", "-Pn", "-p-", "--open"];

/// The external scan command. The target is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Kill the scan after this long. `None` lets it run indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ScanCommand {
    fn default() -> Self {
        ScanCommand {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: None,
        }
    }
}

/// Captured output of one successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    pub target: Target,
    pub stdout: String,
    pub open_ports: u64,
}

impl ScanOutput {
    pub fn from_stdout(target: Target, stdout: String) -> Self {
        let open_ports = count_open(&stdout);
        ScanOutput { target, stdout, open_ports }
    }
}

impl ScanCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ScanCommand { program: program.into(), args, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, target: &Target) -> Command {
        let mut cmd = Command::new(&self.program);
        // The host is a single argv element; no shell ever sees it.
        cmd.args(&self.args)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run the scan against `target` and wait for it to exit.
    pub async fn run(&self, target: &Target) -> Result<ScanOutput, ScanExecutionError> {
        debug!(host = %target, program = %self.program, "spawning scan");
        let child = self.command(target).spawn().map_err(|source| ScanExecutionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ScanExecutionError::Timeout { program: self.program.clone(), timeout: limit })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|source| ScanExecutionError::Wait { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(ScanExecutionError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(ScanOutput::from_stdout(target.clone(), stdout))
    }
}
