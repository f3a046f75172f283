use anyhow::{anyhow, Context, Result};
use nmap_scan::{ScanCommand, DEFAULT_ARGS, DEFAULT_PROGRAM};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "nmap-exporter.yaml";

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string(), format: LogFormat::default() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NmapConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for NmapConfig {
    fn default() -> Self {
        NmapConfig {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub hosts_file: PathBuf,
    pub listen: SocketAddr,
    pub interval_secs: u64,
    pub nmap: NmapConfig,
    /// Unset means no limit on simultaneous nmap processes.
    pub max_concurrent_scans: Option<usize>,
    /// Unset means a hung scan is never killed.
    pub scan_timeout_secs: Option<u64>,
    /// Stamp `last_scan_timestamp` after every scan of the cycle has finished
    /// instead of right after dispatch.
    pub await_scans: bool,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hosts_file: PathBuf::from("hosts.txt"),
            listen: SocketAddr::from(([0, 0, 0, 0], 9910)),
            interval_secs: 24 * 60 * 60,
            nmap: NmapConfig::default(),
            max_concurrent_scans: None,
            scan_timeout_secs: None,
            await_scans: false,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn scan_command(&self) -> ScanCommand {
        ScanCommand::new(self.nmap.program.clone(), self.nmap.args.clone())
            .with_timeout(self.scan_timeout_secs.map(Duration::from_secs))
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(anyhow!("interval_secs must be > 0"));
        }
        if self.max_concurrent_scans == Some(0) {
            return Err(anyhow!("max_concurrent_scans must be > 0"));
        }
        if self.scan_timeout_secs == Some(0) {
            return Err(anyhow!("scan_timeout_secs must be > 0"));
        }
        if self.nmap.program.trim().is_empty() {
            return Err(anyhow!("nmap.program must not be empty"));
        }
        Ok(())
    }
}

pub fn parse_config(s: &str) -> Result<Config> {
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `path`, or `./nmap-exporter.yaml` when no path is given and the file
/// exists. Falls back to built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(Config::default()); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_fixed_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.hosts_file, PathBuf::from("hosts.txt"));
        assert_eq!(cfg.listen.port(), 9910);
        assert_eq!(cfg.interval(), Duration::from_secs(86_400));
        assert_eq!(cfg.scan_command(), ScanCommand::default());
        assert!(!cfg.await_scans);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = parse_config(
            "hosts_file: /etc/nmap-exporter/hosts.txt\nmax_concurrent_scans: 8\nlog:\n  format: json\n",
        )
        .unwrap();
        assert_eq!(cfg.hosts_file, PathBuf::from("/etc/nmap-exporter/hosts.txt"));
        assert_eq!(cfg.max_concurrent_scans, Some(8));
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.listen.port(), 9910);
    }

    #[test]
    fn nmap_section_builds_command() {
        let cfg = parse_config("nmap:\n  program: /usr/bin/nmap\n  args: [\"-sT\", \"--open\"]\nscan_timeout_secs: 600\n").unwrap();
        let cmd = cfg.scan_command();
        assert_eq!(cmd.program, "/usr/bin/nmap");
        assert_eq!(cmd.args, ["-sT", "--open"]);
        assert_eq!(cmd.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config("interval_secs: 0\n").is_err());
        assert!(parse_config("max_concurrent_scans: 0\n").is_err());
        assert!(parse_config("listen: not-an-address\n").is_err());
        assert!(parse_config("unknown_key: 1\n").is_err());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("\n").unwrap(), Config::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "listen: 127.0.0.1:9999\nawait_scans: true").unwrap();
        let cfg = load_config(Some(f.path())).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:9999".parse::<SocketAddr>().unwrap());
        assert!(cfg.await_scans);
    }
}
