//! Configuration for the FastDFS client
//!
//! Centralized configuration with sensible defaults. The on-disk format is a
//! flat `key = value` file; the only required key is `tracker_server`, a
//! comma-separated list of `host:port` entries:
//!
//! ```text
//! tracker_server = 10.0.1.32:22122, 10.0.1.33:22122
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{FdfsError, Result};

/// Default tracker port when a `tracker_server` entry carries no port
pub const DEFAULT_TRACKER_PORT: u16 = 22122;

/// Main configuration for a FastDFS client instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Tracker Configuration
    // -------------------------------------------------------------------------
    /// Tracker host set; a random host is dialed per connection
    pub tracker_hosts: Vec<String>,

    /// Tracker port shared by all hosts in the set
    pub tracker_port: u16,

    // -------------------------------------------------------------------------
    // Pool Configuration (applies to the tracker pool and each storage pool)
    // -------------------------------------------------------------------------
    /// Connections pre-dialed at pool construction
    pub min_conns: usize,

    /// Hard cap on live connections per pool
    pub max_conns: usize,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker_hosts: vec!["127.0.0.1".to_string()],
            tracker_port: DEFAULT_TRACKER_PORT,
            min_conns: 10,
            max_conns: 150,
            connect_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from a flat `key = value` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_str_data(&data)
    }

    /// Parse configuration from file contents
    pub fn from_str_data(data: &str) -> Result<Self> {
        let mut config = Config::default();
        let mut found_tracker = false;

        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.trim() != "tracker_server" {
                continue;
            }

            let mut hosts = Vec::new();
            let mut port = DEFAULT_TRACKER_PORT;
            for entry in value.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                match entry.rsplit_once(':') {
                    Some((host, p)) => {
                        port = p.parse().map_err(|_| {
                            FdfsError::Config(format!("invalid tracker port in {entry:?}"))
                        })?;
                        hosts.push(host.to_string());
                    }
                    None => hosts.push(entry.to_string()),
                }
            }
            if hosts.is_empty() {
                return Err(FdfsError::Config(
                    "tracker_server lists no hosts".to_string(),
                ));
            }
            config.tracker_hosts = hosts;
            config.tracker_port = port;
            found_tracker = true;
        }

        if !found_tracker {
            return Err(FdfsError::Config(
                "missing tracker_server entry".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the tracker host set
    pub fn tracker_hosts(mut self, hosts: Vec<String>) -> Self {
        self.config.tracker_hosts = hosts;
        self
    }

    /// Set the tracker port
    pub fn tracker_port(mut self, port: u16) -> Self {
        self.config.tracker_port = port;
        self
    }

    /// Set the number of pre-dialed connections per pool
    pub fn min_conns(mut self, count: usize) -> Self {
        self.config.min_conns = count;
        self
    }

    /// Set the maximum number of live connections per pool
    pub fn max_conns(mut self, count: usize) -> Self {
        self.config.max_conns = count;
        self
    }

    /// Set the TCP connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
